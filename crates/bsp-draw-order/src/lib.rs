//! Visibility ordering for convex 3D polygons with a BSP tree.
//!
//! Feed in the projected quads of a 3D rendering context, in any order and
//! even when they cut through each other, and get back a painter's-algorithm
//! draw order for any eye position. Polygons crossing a splitting plane are
//! split, with both pieces keeping the original payload.
//!
//! ```
//! use bsp_draw_order::{BspTree, CollectingVisitor, Polygon};
//! use nalgebra::Point3;
//!
//! let floor = Polygon::from_quad(
//!     Point3::new(-1.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, -1.0),
//!     Point3::new(-1.0, 0.0, -1.0),
//!     "floor",
//! )?;
//! let wall = Polygon::from_quad(
//!     Point3::new(-1.0, -1.0, 0.0),
//!     Point3::new(1.0, -1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(-1.0, 1.0, 0.0),
//!     "wall",
//! )?;
//!
//! // The wall pokes through the floor and gets cut in two.
//! let tree = BspTree::from_polygons(vec![floor, wall]);
//! assert_eq!(tree.polygon_count(), 3);
//!
//! let mut visitor = CollectingVisitor::new();
//! let _ = tree.traverse_back_to_front(Point3::new(0.0, 5.0, 5.0), &mut visitor);
//! assert_eq!(visitor.payloads(), vec!["wall", "floor", "wall"]);
//! # Ok::<(), bsp_draw_order::BspError>(())
//! ```

mod config;
mod error;
mod plane;
mod polygon;
mod split;

pub mod bsp;

pub use bsp::{
    BspNode, BspTree, BspVisitor, BuildStats, CollectingVisitor, FewestSplits, FirstPolygon,
    FnVisitor, PlaneSelector,
};
pub use config::BuildConfig;
pub use error::BspError;
pub use plane::{Classification, Plane3D, PlaneSide, PLANE_EPSILON};
pub use polygon::Polygon;
