//! Planes, point sides, and polygon classifications.

use nalgebra::{Point3, Vector3};

/// Default relative tolerance for plane tests.
///
/// The distance below which a point counts as lying on a plane is this value
/// scaled by the magnitude of the coordinates involved (never less than the
/// value itself), see [`Plane3D::tolerance_at`].
pub const PLANE_EPSILON: f32 = 1e-5;

/// Side of a plane a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Positive side, where the normal points.
    Front,
    /// Negative side.
    Back,
    /// Within epsilon of the plane.
    OnPlane,
}

/// Where a polygon sits relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No vertex behind the plane, at least one in front.
    Front,
    /// No vertex in front of the plane, at least one behind.
    Back,
    /// Every vertex on the plane.
    Coplanar,
    /// Vertices on both sides; the polygon straddles the plane and must be split.
    Spanning,
}

/// An oriented plane `normal · p = offset` with a unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a plane from a (not necessarily unit) normal and offset.
    ///
    /// # Panics
    /// Panics if `normal` is zero.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Plane through `point` with the given normal direction, or `None` if the
    /// normal is zero.
    pub fn try_from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let unit_normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self {
            offset: unit_normal.dot(&point.coords),
            normal: unit_normal,
        })
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Signed distance from `point` to the plane, positive on the front side.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies a point with [`PLANE_EPSILON`].
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// Distance within which `point` counts as on the plane.
    ///
    /// `epsilon` is relative: it is scaled by the largest of `point`'s
    /// coordinates and the plane offset, clamped below at 1, so float rounding
    /// in pixel-sized coordinates stays inside the band.
    #[inline]
    pub fn tolerance_at(&self, point: Point3<f32>, epsilon: f32) -> f32 {
        epsilon * point.coords.amax().max(self.offset.abs()).max(1.0)
    }

    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        let tolerance = self.tolerance_at(point, epsilon);
        if dist > tolerance {
            PlaneSide::Front
        } else if dist < -tolerance {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Side of the plane a viewpoint is on, with [`PLANE_EPSILON`].
    ///
    /// Never returns [`PlaneSide::OnPlane`]: an eye lying on the plane sees
    /// the plane edge-on, and is treated as being in front.
    #[inline]
    pub fn side_of_viewpoint(&self, eye: Point3<f32>) -> PlaneSide {
        self.side_of_viewpoint_with_epsilon(eye, PLANE_EPSILON)
    }

    pub fn side_of_viewpoint_with_epsilon(&self, eye: Point3<f32>, epsilon: f32) -> PlaneSide {
        match self.classify_point_with_epsilon(eye, epsilon) {
            PlaneSide::Back => PlaneSide::Back,
            PlaneSide::Front | PlaneSide::OnPlane => PlaneSide::Front,
        }
    }
}
