//! Numerical tolerances used while building a tree.

use crate::PLANE_EPSILON;

/// Tolerances for BSP construction.
///
/// ```
/// use bsp_draw_order::BuildConfig;
///
/// // Treat polygons within 0.1% of their coordinate size as coplanar.
/// let config = BuildConfig::default().with_plane_epsilon(1e-3);
/// assert_eq!(config.plane_epsilon, 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    /// Relative plane tolerance: a point counts as on a plane when its
    /// distance is within this value times its largest coordinate (at least
    /// 1). Applies to validation, the build, and eye tests during traversal.
    pub plane_epsilon: f32,
    /// Split fragments (and input polygons) smaller than this are discarded.
    pub min_fragment_area: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            plane_epsilon: PLANE_EPSILON,
            min_fragment_area: 1e-6,
        }
    }
}

impl BuildConfig {
    /// Sets the plane distance tolerance.
    pub fn with_plane_epsilon(mut self, epsilon: f32) -> Self {
        self.plane_epsilon = epsilon;
        self
    }

    /// Sets the smallest area a fragment may have and still be kept.
    pub fn with_min_fragment_area(mut self, area: f32) -> Self {
        self.min_fragment_area = area;
        self
    }
}
