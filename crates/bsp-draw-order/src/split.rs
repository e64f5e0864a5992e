//! Cutting polygons along a plane.

use log::trace;
use nalgebra::Point3;

use crate::{BuildConfig, Classification, Plane3D, PlaneSide, Polygon};

impl<P: Clone> Polygon<P> {
    /// Cuts the polygon by `plane` with the default [`BuildConfig`].
    ///
    /// Returns `(front, back)`:
    ///
    /// - **Front** or **Coplanar**: `(Some(self), None)`
    /// - **Back**: `(None, Some(self))`
    /// - **Spanning**: one fragment per side, each carrying a copy of the
    ///   payload. A fragment too small to keep comes back as `None`.
    pub fn split(self, plane: &Plane3D) -> (Option<Self>, Option<Self>) {
        self.split_with(plane, &BuildConfig::default())
    }

    pub fn split_with(self, plane: &Plane3D, config: &BuildConfig) -> (Option<Self>, Option<Self>) {
        match self.classify_with_epsilon(plane, config.plane_epsilon) {
            Classification::Front | Classification::Coplanar => (Some(self), None),
            Classification::Back => (None, Some(self)),
            Classification::Spanning => split_spanning(self, plane, config),
        }
    }
}

/// Sutherland-Hodgman against a single plane, producing both sides at once.
///
/// On-plane vertices go to both fragments; every edge that crosses from one
/// side to the other adds its intersection point to both. Convexity of the
/// input guarantees each side is a single convex loop.
pub(crate) fn split_spanning<P: Clone>(
    polygon: Polygon<P>,
    plane: &Plane3D,
    config: &BuildConfig,
) -> (Option<Polygon<P>>, Option<Polygon<P>>) {
    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts = Vec::with_capacity(n + 1);
    let mut back_verts = Vec::with_capacity(n + 1);

    let distances: Vec<f32> = vertices.iter().map(|v| plane.signed_distance(*v)).collect();
    let sides: Vec<PlaneSide> = vertices
        .iter()
        .map(|v| plane.classify_point_with_epsilon(*v, config.plane_epsilon))
        .collect();

    for i in 0..n {
        let current = vertices[i];
        let next_idx = (i + 1) % n;

        match sides[i] {
            PlaneSide::Front => front_verts.push(current),
            PlaneSide::Back => back_verts.push(current),
            PlaneSide::OnPlane => {
                front_verts.push(current);
                back_verts.push(current);
            }
        }

        let crosses = matches!(
            (sides[i], sides[next_idx]),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );
        if crosses {
            // The endpoints lie strictly on opposite sides, so the
            // denominator is nonzero whatever the tolerance.
            let t = distances[i] / (distances[i] - distances[next_idx]);
            let hit = current + (vertices[next_idx] - current) * t;
            front_verts.push(hit);
            back_verts.push(hit);
        }
    }

    let parent_plane = polygon.plane().clone();
    let back_payload = polygon.payload().clone();
    let front_payload = polygon.into_payload();

    let front = keep_fragment(front_verts, parent_plane.clone(), front_payload, config);
    let back = keep_fragment(back_verts, parent_plane, back_payload, config);
    (front, back)
}

fn keep_fragment<P>(
    vertices: Vec<Point3<f32>>,
    plane: Plane3D,
    payload: P,
    config: &BuildConfig,
) -> Option<Polygon<P>> {
    if vertices.len() < 3 {
        trace!("dropping split fragment with {} vertices", vertices.len());
        return None;
    }

    let fragment = Polygon::from_fragment(vertices, plane, payload);
    if fragment.area() <= config.min_fragment_area {
        trace!("dropping split fragment with area {}", fragment.area());
        return None;
    }
    Some(fragment)
}
