//! BSP tree node.

use crate::{Plane3D, Polygon};

/// A node in the BSP tree.
///
/// The node owns the polygon whose plane partitions space at this level (the
/// *splitter*), every other polygon lying in that plane, and the two subtrees
/// on either side of it.
///
/// # Coplanar polygons
///
/// Polygons in the splitter's plane are kept apart by which way they face:
/// - `coplanar_front`: normal points the same way as the splitter's
/// - `coplanar_back`: normal points the opposite way
///
/// Traversal emits the two lists on opposite sides of the splitter, so the
/// group facing the viewer is drawn last.
///
/// Every polygon under `front` lies in the closed front half-space of the
/// plane (within the build epsilon), and likewise for `back`.
#[derive(Debug, Clone)]
pub struct BspNode<P = ()> {
    splitter: Polygon<P>,
    coplanar_front: Vec<Polygon<P>>,
    coplanar_back: Vec<Polygon<P>>,
    front: Option<Box<BspNode<P>>>,
    back: Option<Box<BspNode<P>>>,
}

impl<P> BspNode<P> {
    pub(crate) fn new(splitter: Polygon<P>) -> Self {
        Self {
            splitter,
            coplanar_front: Vec::new(),
            coplanar_back: Vec::new(),
            front: None,
            back: None,
        }
    }

    /// The polygon this node was split on.
    #[inline]
    pub fn splitter(&self) -> &Polygon<P> {
        &self.splitter
    }

    /// The splitting plane, oriented like the splitter.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        self.splitter.plane()
    }

    #[inline]
    pub fn coplanar_front(&self) -> &[Polygon<P>] {
        &self.coplanar_front
    }

    #[inline]
    pub fn coplanar_back(&self) -> &[Polygon<P>] {
        &self.coplanar_back
    }

    /// Every polygon stored at this node: the splitter, then both coplanar lists.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<P>> {
        std::iter::once(&self.splitter)
            .chain(self.coplanar_front.iter())
            .chain(self.coplanar_back.iter())
    }

    #[inline]
    pub fn front(&self) -> Option<&BspNode<P>> {
        self.front.as_deref()
    }

    #[inline]
    pub fn back(&self) -> Option<&BspNode<P>> {
        self.back.as_deref()
    }

    #[inline]
    pub(crate) fn set_front(&mut self, node: Option<BspNode<P>>) {
        self.front = node.map(Box::new);
    }

    #[inline]
    pub(crate) fn set_back(&mut self, node: Option<BspNode<P>>) {
        self.back = node.map(Box::new);
    }

    /// Files a polygon lying in this node's plane under the list matching its facing.
    pub(crate) fn add_coplanar(&mut self, polygon: Polygon<P>) {
        if polygon.faces_same_direction(self.splitter.plane()) {
            self.coplanar_front.push(polygon);
        } else {
            self.coplanar_back.push(polygon);
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// Polygons stored at this node only.
    #[inline]
    pub fn local_count(&self) -> usize {
        1 + self.coplanar_front.len() + self.coplanar_back.len()
    }

    /// Polygons in this subtree, splitters included.
    pub fn polygon_count(&self) -> usize {
        self.local_count()
            + self.front.as_ref().map_or(0, |n| n.polygon_count())
            + self.back.as_ref().map_or(0, |n| n.polygon_count())
    }

    /// Nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.front.as_ref().map_or(0, |n| n.node_count())
            + self.back.as_ref().map_or(0, |n| n.node_count())
    }

    /// Depth of this subtree (1 for a leaf).
    pub fn depth(&self) -> usize {
        let front_depth = self.front.as_ref().map_or(0, |n| n.depth());
        let back_depth = self.back.as_ref().map_or(0, |n| n.depth());
        1 + front_depth.max(back_depth)
    }

    pub(crate) fn into_polygons(self, out: &mut Vec<Polygon<P>>) {
        out.push(self.splitter);
        out.extend(self.coplanar_front);
        out.extend(self.coplanar_back);
        if let Some(front) = self.front {
            front.into_polygons(out);
        }
        if let Some(back) = self.back {
            back.into_polygons(out);
        }
    }
}
