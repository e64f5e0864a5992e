//! Errors raised when a polygon is rejected at construction.

use std::fmt;

/// A polygon that cannot take part in a BSP tree.
///
/// These are caller bugs surfaced at the boundary: the tree build and the
/// traversals themselves never fail.
#[derive(Debug, Clone, PartialEq)]
pub enum BspError {
    /// Fewer than three vertices.
    TooFewVertices { count: usize },
    /// The vertex loop encloses (almost) no area.
    Degenerate { area: f32 },
    /// A vertex lies off the polygon's plane by more than the tolerance.
    NonPlanar { distance: f32 },
    /// The vertex loop turns the wrong way at this corner.
    NonConvex { corner: usize },
}

impl fmt::Display for BspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewVertices { count } => {
                write!(f, "polygon needs at least 3 vertices, got {count}")
            }
            Self::Degenerate { area } => write!(f, "polygon is degenerate (area {area})"),
            Self::NonPlanar { distance } => {
                write!(f, "polygon is not planar (vertex {distance} off its plane)")
            }
            Self::NonConvex { corner } => write!(f, "polygon is not convex at vertex {corner}"),
        }
    }
}

impl std::error::Error for BspError {}
