//! Convex planar polygons carrying a caller payload.

use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

use crate::{BspError, BuildConfig, Classification, Plane3D, PlaneSide};

/// A convex polygon in 3D space with an opaque payload.
///
/// Vertices are coplanar and wound counter-clockwise when seen from the
/// front, the side the normal points to. The payload identifies whatever the
/// polygon was produced from (typically the draw parameters of a quad) and is
/// copied onto both fragments whenever the polygon is split.
///
/// Polygons are immutable once built. Validation happens in the constructors,
/// so everything that reaches a [`BspTree`](crate::BspTree) is well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon<P = ()> {
    vertices: Vec<Point3<f32>>,
    plane: Plane3D,
    area: f32,
    payload: P,
}

impl<P> Polygon<P> {
    /// Creates a polygon from its vertex loop, validated with the default
    /// [`BuildConfig`] tolerances.
    pub fn new(vertices: Vec<Point3<f32>>, payload: P) -> Result<Self, BspError> {
        Self::with_config(vertices, payload, &BuildConfig::default())
    }

    /// Creates a polygon, rejecting anything a BSP tree could not hold:
    /// fewer than three vertices, (near) zero area, vertices off the plane,
    /// or a reflex corner.
    ///
    /// The planarity test scales `config.plane_epsilon` with the coordinates,
    /// as [`Plane3D::tolerance_at`] does.
    pub fn with_config(
        vertices: Vec<Point3<f32>>,
        payload: P,
        config: &BuildConfig,
    ) -> Result<Self, BspError> {
        if vertices.len() < 3 {
            return Err(BspError::TooFewVertices {
                count: vertices.len(),
            });
        }

        let normal = newell_normal(&vertices);
        let area = normal.norm() * 0.5;
        if !area.is_finite() || area <= config.min_fragment_area {
            return Err(BspError::Degenerate { area });
        }

        let plane = Plane3D::try_from_point_and_normal(centroid_of(&vertices), normal)
            .ok_or(BspError::Degenerate { area })?;

        if let Some(distance) = vertices
            .iter()
            .filter(|v| {
                plane.classify_point_with_epsilon(**v, config.plane_epsilon) != PlaneSide::OnPlane
            })
            .map(|v| plane.signed_distance(*v).abs())
            .reduce(f32::max)
        {
            return Err(BspError::NonPlanar { distance });
        }

        if let Some(corner) = reflex_corner(&vertices, &plane.normal(), config.plane_epsilon) {
            return Err(BspError::NonConvex { corner });
        }

        Ok(Self {
            vertices,
            plane,
            area,
            payload,
        })
    }

    /// Creates a quad from four corners in winding order.
    pub fn from_quad(
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
        d: Point3<f32>,
        payload: P,
    ) -> Result<Self, BspError> {
        Self::new(vec![a, b, c, d], payload)
    }

    /// Maps a flat layer rectangle into 3D.
    ///
    /// The rectangle spans `origin..origin + size` in the layer's own `z = 0`
    /// plane; each corner is sent through `transform` with a perspective
    /// divide. Points that end up behind a projective camera (`w <= 0`) are
    /// not clipped.
    pub fn from_transformed_rect(
        origin: Point2<f32>,
        size: Vector2<f32>,
        transform: &Matrix4<f32>,
        payload: P,
    ) -> Result<Self, BspError> {
        Self::from_transformed_rect_with_config(
            origin,
            size,
            transform,
            payload,
            &BuildConfig::default(),
        )
    }

    pub fn from_transformed_rect_with_config(
        origin: Point2<f32>,
        size: Vector2<f32>,
        transform: &Matrix4<f32>,
        payload: P,
        config: &BuildConfig,
    ) -> Result<Self, BspError> {
        let corners = [
            Point3::new(origin.x, origin.y, 0.0),
            Point3::new(origin.x + size.x, origin.y, 0.0),
            Point3::new(origin.x + size.x, origin.y + size.y, 0.0),
            Point3::new(origin.x, origin.y + size.y, 0.0),
        ];
        let vertices = corners.iter().map(|c| transform.transform_point(c)).collect();
        Self::with_config(vertices, payload, config)
    }

    /// Builds a split fragment. The vertices come from clipping a valid
    /// polygon, so they inherit its plane instead of being re-validated.
    pub(crate) fn from_fragment(vertices: Vec<Point3<f32>>, plane: Plane3D, payload: P) -> Self {
        let area = newell_normal(&vertices).norm() * 0.5;
        Self {
            vertices,
            plane,
            area,
            payload,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false: a constructed polygon has at least three vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Replaces the payload, keeping the geometry.
    pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> Polygon<Q> {
        Polygon {
            vertices: self.vertices,
            plane: self.plane,
            area: self.area,
            payload: f(self.payload),
        }
    }

    /// Unit normal, following the vertex winding.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.plane.normal()
    }

    /// The oriented plane the polygon lies on.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Vertex average; inside the polygon since it is convex.
    pub fn centroid(&self) -> Point3<f32> {
        centroid_of(&self.vertices)
    }

    /// Classifies this polygon against `plane` with the default tolerance.
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        self.classify_with_epsilon(plane, crate::PLANE_EPSILON)
    }

    pub fn classify_with_epsilon(&self, plane: &Plane3D, epsilon: f32) -> Classification {
        let mut front = 0;
        let mut back = 0;

        for vertex in &self.vertices {
            match plane.classify_point_with_epsilon(*vertex, epsilon) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) => Classification::Coplanar,
            (_, 0) => Classification::Front,
            (0, _) => Classification::Back,
            _ => Classification::Spanning,
        }
    }

    /// Whether this polygon's normal points the same way as the plane's.
    #[inline]
    pub fn faces_same_direction(&self, plane: &Plane3D) -> bool {
        self.normal().dot(&plane.normal()) > 0.0
    }
}

/// Newell's method: the normal of the whole loop, scaled to twice its area.
fn newell_normal(vertices: &[Point3<f32>]) -> Vector3<f32> {
    let mut normal = Vector3::zeros();
    for (i, current) in vertices.iter().enumerate() {
        let next = vertices[(i + 1) % vertices.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

fn centroid_of(vertices: &[Point3<f32>]) -> Point3<f32> {
    let sum: Vector3<f32> = vertices.iter().map(|p| p.coords).sum();
    Point3::from(sum / vertices.len() as f32)
}

/// First corner where the loop turns clockwise about `normal`, if any.
/// Collinear corners are allowed.
fn reflex_corner(vertices: &[Point3<f32>], normal: &Vector3<f32>, epsilon: f32) -> Option<usize> {
    let n = vertices.len();
    (0..n).find(|&i| {
        let prev = vertices[(i + n - 1) % n];
        let current = vertices[i];
        let next = vertices[(i + 1) % n];
        let incoming = current - prev;
        let outgoing = next - current;
        let turn = incoming.cross(&outgoing).dot(normal);
        turn < -epsilon * incoming.norm() * outgoing.norm()
    })
}
