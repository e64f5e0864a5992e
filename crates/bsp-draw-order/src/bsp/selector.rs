//! Pivot selection for BSP construction.
//!
//! The pivot only changes how many fragments the build produces and how
//! deep the tree gets. Any selector yields a correct draw order.

use crate::{BuildConfig, Classification, Polygon};

/// Picks which polygon splits the current work list.
pub trait PlaneSelector {
    /// Index of the pivot in `polygons`, or `None` if the slice is empty.
    fn select<P>(&self, polygons: &[Polygon<P>], config: &BuildConfig) -> Option<usize>;
}

/// Always pivots on the first polygon of the work list.
///
/// Cheap and deterministic; the tree shape follows input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPolygon;

impl PlaneSelector for FirstPolygon {
    fn select<P>(&self, polygons: &[Polygon<P>], _config: &BuildConfig) -> Option<usize> {
        if polygons.is_empty() { None } else { Some(0) }
    }
}

/// Scores the first `sample` candidates by how many polygons their plane
/// would split, then by how lopsided the front/back lists would be, and
/// picks the cheapest. Ties go to the earlier candidate.
///
/// Costs `O(sample * n)` per node.
#[derive(Debug, Clone, Copy)]
pub struct FewestSplits {
    pub sample: usize,
    pub split_weight: f32,
    pub balance_weight: f32,
}

impl Default for FewestSplits {
    fn default() -> Self {
        Self {
            sample: 20,
            split_weight: 8.0,
            balance_weight: 1.0,
        }
    }
}

impl FewestSplits {
    fn score<P>(&self, pivot: usize, polygons: &[Polygon<P>], config: &BuildConfig) -> f32 {
        let plane = polygons[pivot].plane();
        let (mut front, mut back, mut spanning) = (0i64, 0i64, 0i64);

        for (i, polygon) in polygons.iter().enumerate() {
            if i == pivot {
                continue;
            }
            match polygon.classify_with_epsilon(plane, config.plane_epsilon) {
                Classification::Front => front += 1,
                Classification::Back => back += 1,
                Classification::Coplanar => {}
                Classification::Spanning => spanning += 1,
            }
        }

        self.split_weight * spanning as f32 + self.balance_weight * (front - back).abs() as f32
    }
}

impl PlaneSelector for FewestSplits {
    fn select<P>(&self, polygons: &[Polygon<P>], config: &BuildConfig) -> Option<usize> {
        let candidates = polygons.len().min(self.sample.max(1));
        let mut best: Option<(usize, f32)> = None;

        for pivot in 0..candidates {
            let score = self.score(pivot, polygons, config);
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((pivot, score));
            }
        }

        best.map(|(pivot, _)| pivot)
    }
}
