//! Drawing helpers for the draw-order viewer.

use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;

use bsp_draw_order::{BspVisitor, Polygon};
use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::{Matrix4, Point2, Point3, Rotation3, Translation3, Unit, Vector2, Vector3};

/// Payload carried by every layer polygon: the index of the layer it came from.
pub type LayerId = usize;

/// Deterministic color per layer.
///
/// Hashes the payload rather than the geometry, so both halves of a split
/// layer are drawn in the same color.
pub fn layer_color(layer: LayerId) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    layer.hash(&mut hasher);
    let hash = hasher.finish();

    let r = (((hash >> 16) & 0xFF) as u8).max(40);
    let g = (((hash >> 8) & 0xFF) as u8).max(40);
    let b = ((hash & 0xFF) as u8).max(40);

    Color::from_rgba(r, g, b, 255)
}

/// Draws a convex polygon as a triangle fan.
pub fn draw_polygon(polygon: &Polygon<LayerId>) {
    let verts = polygon.vertices();
    let color = layer_color(*polygon.payload());

    let mesh_vertices: Vec<Vertex> = verts
        .iter()
        .map(|p| Vertex::new2(vec3(p.x, p.y, p.z), vec2(0.0, 0.0), color))
        .collect();

    let mut indices: Vec<u16> = Vec::with_capacity((verts.len() - 2) * 3);
    for i in 1..verts.len() - 1 {
        indices.extend([0, i as u16, (i + 1) as u16]);
    }

    draw_mesh(&Mesh {
        vertices: mesh_vertices,
        indices,
        texture: None,
    });
}

/// Draws every visited polygon immediately, so screen order is visit order.
#[derive(Debug, Default)]
pub struct RenderVisitor {
    pub drawn: usize,
}

impl BspVisitor<LayerId> for RenderVisitor {
    fn visit(&mut self, polygon: &Polygon<LayerId>) -> ControlFlow<()> {
        draw_polygon(polygon);
        self.drawn += 1;
        ControlFlow::Continue(())
    }
}

fn layer_transform(axis: Unit<Vector3<f32>>, angle: f32, offset: Vector3<f32>) -> Matrix4<f32> {
    Translation3::from(offset).to_homogeneous()
        * Rotation3::from_axis_angle(&axis, angle).to_homogeneous()
}

/// A fan of square layers rotated about a shared axis, so every pair
/// intersects along it, plus a tilted card cutting through the fan and a floor
/// underneath. Layer `i` carries payload `i`.
pub fn generate_layer_scene() -> Vec<Polygon<LayerId>> {
    let mut transforms = Vec::new();

    for i in 0..5 {
        let angle = i as f32 * std::f32::consts::PI / 5.0;
        transforms.push(
            layer_transform(Vector3::y_axis(), angle, Vector3::zeros())
                * Translation3::new(-1.0, -1.0, 0.0).to_homogeneous(),
        );
    }

    transforms.push(layer_transform(
        Vector3::x_axis(),
        0.6,
        Vector3::new(-1.5, -0.4, -1.0),
    ));

    let mut layers: Vec<Polygon<LayerId>> = transforms
        .iter()
        .enumerate()
        .filter_map(|(id, transform)| {
            Polygon::from_transformed_rect(
                Point2::origin(),
                Vector2::new(2.0, 2.0),
                transform,
                id,
            )
            .map_err(|e| log::warn!("layer {id} rejected: {e}"))
            .ok()
        })
        .collect();

    // Floor at y = -1.5, facing up.
    let floor = Polygon::from_quad(
        Point3::new(-2.5, -1.5, 2.5),
        Point3::new(2.5, -1.5, 2.5),
        Point3::new(2.5, -1.5, -2.5),
        Point3::new(-2.5, -1.5, -2.5),
        layers.len(),
    );
    match floor {
        Ok(floor) => layers.push(floor),
        Err(e) => log::warn!("floor rejected: {e}"),
    }

    layers
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            zoom_speed: 0.5,
            min_distance: 2.0,
            max_distance: 30.0,
        }
    }

    /// Mouse drag rotates, wheel zooms, arrow keys nudge.
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        if is_key_down(KeyCode::Left) {
            self.yaw += 0.02;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= 0.02;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += 0.02;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= 0.02;
        }
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance = (self.distance - scroll * self.zoom_speed)
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            ..Default::default()
        }
    }

    /// The eye position for tree traversal.
    pub fn eye_point(&self) -> Point3<f32> {
        let pos = self.position();
        Point3::new(pos.x, pos.y, pos.z)
    }
}
