//! The partition tree: nodes, construction, and ordered traversal.
//!
//! - [`BspTree`]: owns the root node, builds from polygons, walks per viewpoint
//! - [`BspNode`]: one splitting polygon, its coplanar neighbours, two subtrees
//! - [`PlaneSelector`]: how the build picks each splitting polygon
//! - [`BspVisitor`]: receives polygons in draw order

mod node;
mod selector;
mod tree;
mod visitor;

pub use node::BspNode;
pub use selector::{FewestSplits, FirstPolygon, PlaneSelector};
pub use tree::{BspTree, BuildStats};
pub use visitor::{BspVisitor, CollectingVisitor, FnVisitor};
