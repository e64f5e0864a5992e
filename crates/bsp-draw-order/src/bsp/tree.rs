//! BSP tree construction and viewpoint-ordered traversal.

use std::ops::ControlFlow;

use log::{debug, trace, warn};
use nalgebra::Point3;

use crate::split::split_spanning;
use crate::{BuildConfig, Classification, PlaneSide, Polygon};

use super::node::BspNode;
use super::selector::{FirstPolygon, PlaneSelector};
use super::visitor::{BspVisitor, FnVisitor};

/// A Binary Space Partitioning tree over convex polygons.
///
/// The tree is built once from an unordered set of polygons, possibly
/// intersecting each other, and then walked as often as needed to get a
/// painter's-algorithm order for any viewpoint. Polygons that cross a
/// splitting plane are cut in two during the build, so the walk never has to
/// draw a nearer surface before a farther one it overlaps.
///
/// ```
/// use bsp_draw_order::{BspTree, Polygon};
/// use nalgebra::Point3;
///
/// let square = |z: f32, id: u32| {
///     Polygon::from_quad(
///         Point3::new(0.0, 0.0, z),
///         Point3::new(1.0, 0.0, z),
///         Point3::new(1.0, 1.0, z),
///         Point3::new(0.0, 1.0, z),
///         id,
///     )
///     .unwrap()
/// };
///
/// let tree = BspTree::from_polygons(vec![square(1.0, 1), square(0.0, 0), square(2.0, 2)]);
///
/// let order: Vec<u32> = tree
///     .draw_order(Point3::new(0.5, 0.5, 10.0))
///     .into_iter()
///     .map(|p| *p.payload())
///     .collect();
/// assert_eq!(order, vec![0, 1, 2]);
/// ```
///
/// The tree is immutable after construction. Traversals take `&self`, so a
/// built tree can be shared between threads and walked concurrently.
#[derive(Debug, Clone)]
pub struct BspTree<P = ()> {
    root: Option<BspNode<P>>,
    stats: BuildStats,
    config: BuildConfig,
}

/// Counters gathered while building a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Polygons handed to the build.
    pub input_polygons: usize,
    /// Input polygons discarded for being below `min_fragment_area`.
    pub filtered_polygons: usize,
    /// Polygons (or fragments) cut in two by a splitting plane.
    pub splits: usize,
    /// Split fragments discarded as degenerate.
    pub dropped_fragments: usize,
    pub nodes: usize,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    BackToFront,
    FrontToBack,
}

impl<P> Default for BspTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BspTree<P> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: None,
            stats: BuildStats::default(),
            config: BuildConfig::default(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<&BspNode<P>> {
        self.root.as_ref()
    }

    /// Number of polygons and fragments stored in the tree.
    pub fn polygon_count(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.polygon_count())
    }

    /// Maximum depth of the tree (0 when empty).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.depth())
    }

    #[inline]
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Tolerances the tree was built with. Traversal classifies the eye with
    /// the same `plane_epsilon`.
    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// All stored polygons, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Polygon<P>> {
        let mut stack: Vec<&BspNode<P>> = self.root.iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.front());
            stack.extend(node.back());
            Some(node)
        })
        .flat_map(|node| node.polygons())
    }

    /// Takes the stored polygons and fragments back out of the tree.
    pub fn into_polygons(self) -> Vec<Polygon<P>> {
        let mut result = Vec::new();
        if let Some(root) = self.root {
            root.into_polygons(&mut result);
        }
        result
    }

    /// Walks the tree far-to-near as seen from `eye` (painter's order).
    ///
    /// At each node the eye is tested against the splitting plane. With the
    /// eye in front (or exactly on the plane) the visit order is: back
    /// subtree, back-facing coplanars, splitter, front-facing coplanars,
    /// front subtree. With the eye behind, the mirror order is used.
    ///
    /// Returns `Break` if the visitor asked to stop.
    pub fn traverse_back_to_front<V: BspVisitor<P>>(
        &self,
        eye: Point3<f32>,
        visitor: &mut V,
    ) -> ControlFlow<()> {
        self.walk(eye, Order::BackToFront, &mut |p| visitor.visit(p))
    }

    /// Walks the tree near-to-far as seen from `eye`: exactly the reverse of
    /// [`traverse_back_to_front`](Self::traverse_back_to_front).
    pub fn traverse_front_to_back<V: BspVisitor<P>>(
        &self,
        eye: Point3<f32>,
        visitor: &mut V,
    ) -> ControlFlow<()> {
        self.walk(eye, Order::FrontToBack, &mut |p| visitor.visit(p))
    }

    /// Calls `f` on every polygon in painter's order.
    pub fn for_each_back_to_front(&self, eye: Point3<f32>, mut f: impl FnMut(&Polygon<P>)) {
        let mut visitor = FnVisitor::new(|p: &Polygon<P>| {
            f(p);
            ControlFlow::Continue(())
        });
        let _ = self.traverse_back_to_front(eye, &mut visitor);
    }

    /// The polygons in painter's order, borrowed from the tree.
    pub fn draw_order(&self, eye: Point3<f32>) -> Vec<&Polygon<P>> {
        let mut order = Vec::with_capacity(self.polygon_count());
        let _ = self.walk(eye, Order::BackToFront, &mut |p| {
            order.push(p);
            ControlFlow::Continue(())
        });
        order
    }

    fn walk<'a>(
        &'a self,
        eye: Point3<f32>,
        order: Order,
        visit: &mut impl FnMut(&'a Polygon<P>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        match self.root {
            Some(ref root) => walk_node(root, eye, order, self.config.plane_epsilon, visit),
            None => ControlFlow::Continue(()),
        }
    }
}

impl<P: Clone> BspTree<P> {
    /// Builds a tree with [`FirstPolygon`] pivots and default tolerances.
    pub fn from_polygons(polygons: Vec<Polygon<P>>) -> Self {
        Self::build(polygons, &FirstPolygon, &BuildConfig::default())
    }

    /// Builds a tree, taking ownership of `polygons`.
    ///
    /// Input order and duplicates are fine. Polygons with less area than
    /// `config.min_fragment_area` are skipped with a warning.
    pub fn build<S: PlaneSelector>(
        polygons: Vec<Polygon<P>>,
        selector: &S,
        config: &BuildConfig,
    ) -> Self {
        let mut stats = BuildStats {
            input_polygons: polygons.len(),
            ..BuildStats::default()
        };

        let polygons: Vec<Polygon<P>> = polygons
            .into_iter()
            .filter(|p| {
                let keep = p.area() > config.min_fragment_area;
                if !keep {
                    warn!("skipping degenerate polygon with area {}", p.area());
                }
                keep
            })
            .collect();
        stats.filtered_polygons = stats.input_polygons - polygons.len();

        let root = build_node(polygons, selector, config, &mut stats);
        stats.nodes = root.as_ref().map_or(0, |n| n.node_count());
        stats.depth = root.as_ref().map_or(0, |n| n.depth());

        debug!(
            "built BSP tree: {} input polygons, {} filtered, {} splits, {} dropped fragments, {} nodes, depth {}",
            stats.input_polygons,
            stats.filtered_polygons,
            stats.splits,
            stats.dropped_fragments,
            stats.nodes,
            stats.depth
        );

        Self {
            root,
            stats,
            config: *config,
        }
    }
}

/// Recursively builds a node from a work list.
fn build_node<P: Clone, S: PlaneSelector>(
    mut polygons: Vec<Polygon<P>>,
    selector: &S,
    config: &BuildConfig,
    stats: &mut BuildStats,
) -> Option<BspNode<P>> {
    let pivot = selector.select(&polygons, config)?;
    // `remove` keeps the remaining order, so `FirstPolygon` pivots in input order.
    let mut node = BspNode::new(polygons.remove(pivot));
    let plane = node.plane().clone();

    let mut front_list = Vec::new();
    let mut back_list = Vec::new();

    for polygon in polygons {
        match polygon.classify_with_epsilon(&plane, config.plane_epsilon) {
            Classification::Front => front_list.push(polygon),
            Classification::Back => back_list.push(polygon),
            Classification::Coplanar => node.add_coplanar(polygon),
            Classification::Spanning => {
                stats.splits += 1;
                let (front, back) = split_spanning(polygon, &plane, config);
                trace!(
                    "split polygon: front fragment {}, back fragment {}",
                    front.is_some(),
                    back.is_some()
                );
                match front {
                    Some(f) => front_list.push(f),
                    None => stats.dropped_fragments += 1,
                }
                match back {
                    Some(b) => back_list.push(b),
                    None => stats.dropped_fragments += 1,
                }
            }
        }
    }

    node.set_front(build_node(front_list, selector, config, stats));
    node.set_back(build_node(back_list, selector, config, stats));

    Some(node)
}

fn walk_node<'a, P>(
    node: &'a BspNode<P>,
    eye: Point3<f32>,
    order: Order,
    epsilon: f32,
    visit: &mut impl FnMut(&'a Polygon<P>) -> ControlFlow<()>,
) -> ControlFlow<()> {
    // Far side first: whatever is on the other side of the plane from the eye.
    let (far_child, far_coplanar, near_coplanar, near_child) =
        match node.plane().side_of_viewpoint_with_epsilon(eye, epsilon) {
            PlaneSide::Back => (
                node.front(),
                node.coplanar_front(),
                node.coplanar_back(),
                node.back(),
            ),
            PlaneSide::Front | PlaneSide::OnPlane => (
                node.back(),
                node.coplanar_back(),
                node.coplanar_front(),
                node.front(),
            ),
        };

    match order {
        Order::BackToFront => {
            if let Some(child) = far_child {
                walk_node(child, eye, order, epsilon, visit)?;
            }
            for polygon in far_coplanar {
                visit(polygon)?;
            }
            visit(node.splitter())?;
            for polygon in near_coplanar {
                visit(polygon)?;
            }
            if let Some(child) = near_child {
                walk_node(child, eye, order, epsilon, visit)?;
            }
        }
        Order::FrontToBack => {
            if let Some(child) = near_child {
                walk_node(child, eye, order, epsilon, visit)?;
            }
            for polygon in near_coplanar.iter().rev() {
                visit(polygon)?;
            }
            visit(node.splitter())?;
            for polygon in far_coplanar.iter().rev() {
                visit(polygon)?;
            }
            if let Some(child) = far_child {
                walk_node(child, eye, order, epsilon, visit)?;
            }
        }
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::selector::FewestSplits;
    use crate::bsp::visitor::CollectingVisitor;
    use nalgebra::{Point2, Rotation3, Translation3, Unit, Vector2, Vector3};

    fn square(z: f32, facing_up: bool, id: u32) -> Polygon<u32> {
        let mut vertices = vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ];
        if !facing_up {
            vertices.reverse();
        }
        Polygon::new(vertices, id).unwrap()
    }

    /// Unit-high square in the x = 0.5 plane reaching from z = -1 to z = 1.
    fn wall(id: u32) -> Polygon<u32> {
        Polygon::from_quad(
            Point3::new(0.5, 0.0, -1.0),
            Point3::new(0.5, 1.0, -1.0),
            Point3::new(0.5, 1.0, 1.0),
            Point3::new(0.5, 0.0, 1.0),
            id,
        )
        .unwrap()
    }

    /// Two-by-two layers at assorted tilts, all passing near the origin so
    /// that most pairs intersect.
    fn tangled_scene() -> Vec<Polygon<u32>> {
        let placements: [(Unit<Vector3<f32>>, f32, Vector3<f32>); 8] = [
            (Vector3::y_axis(), 0.0, Vector3::new(-1.0, -1.0, 0.0)),
            (Vector3::y_axis(), 1.2, Vector3::new(-0.5, -1.0, 0.3)),
            (Vector3::x_axis(), 0.9, Vector3::new(-1.0, -0.5, -0.4)),
            (Vector3::x_axis(), -0.7, Vector3::new(-0.8, -0.2, 0.6)),
            (Vector3::z_axis(), 0.5, Vector3::new(-0.3, -0.6, -0.2)),
            (Vector3::y_axis(), -0.8, Vector3::new(-0.2, -0.9, -0.5)),
            (Vector3::x_axis(), 2.1, Vector3::new(-0.6, 0.4, 0.1)),
            (Vector3::y_axis(), 2.6, Vector3::new(0.7, -0.7, 0.2)),
        ];

        placements
            .iter()
            .enumerate()
            .map(|(i, (axis, angle, offset))| {
                let transform = Translation3::from(*offset).to_homogeneous()
                    * Rotation3::from_axis_angle(axis, *angle).to_homogeneous();
                Polygon::from_transformed_rect(
                    Point2::new(0.0, 0.0),
                    Vector2::new(2.0, 2.0),
                    &transform,
                    i as u32,
                )
                .unwrap()
            })
            .collect()
    }

    fn eyes() -> [Point3<f32>; 5] {
        [
            Point3::new(0.0, 0.0, 10.0),
            Point3::new(3.0, 2.0, -6.0),
            Point3::new(-5.0, 4.0, 1.0),
            Point3::new(0.3, -7.0, 0.5),
            Point3::new(6.0, 6.0, 6.0),
        ]
    }

    fn payloads_back_to_front(tree: &BspTree<u32>, eye: Point3<f32>) -> Vec<u32> {
        let mut visitor = CollectingVisitor::new();
        assert!(tree.traverse_back_to_front(eye, &mut visitor).is_continue());
        visitor.payloads()
    }

    fn subtree_polygons<'a, P>(node: Option<&'a BspNode<P>>, out: &mut Vec<&'a Polygon<P>>) {
        if let Some(node) = node {
            out.extend(node.polygons());
            subtree_polygons(node.front(), out);
            subtree_polygons(node.back(), out);
        }
    }

    /// Whether `point` is inside the convex polygon, at least `margin` from every edge.
    fn strictly_inside<P>(polygon: &Polygon<P>, point: Point3<f32>, margin: f32) -> bool {
        let vertices = polygon.vertices();
        let normal = polygon.normal();
        (0..vertices.len()).all(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            let edge = b - a;
            edge.cross(&(point - a)).dot(&normal) > margin * edge.norm()
        })
    }

    #[test]
    fn empty_tree() {
        let tree = BspTree::<u32>::new();
        assert!(tree.is_empty());
        assert_eq!(tree.polygon_count(), 0);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn empty_input_traverses_nothing() {
        let tree = BspTree::<u32>::from_polygons(vec![]);
        assert!(tree.is_empty());

        let mut visitor = CollectingVisitor::new();
        assert!(tree
            .traverse_back_to_front(Point3::origin(), &mut visitor)
            .is_continue());
        assert!(visitor.polygons().is_empty());
        assert!(tree.draw_order(Point3::origin()).is_empty());
    }

    #[test]
    fn single_polygon() {
        let tree = BspTree::from_polygons(vec![square(0.0, true, 9)]);
        assert_eq!(tree.polygon_count(), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.0, 0.0, -3.0)), vec![9]);
    }

    #[test]
    fn three_stacked_squares_both_ways() {
        let tree = BspTree::from_polygons(vec![
            square(0.0, true, 0),
            square(1.0, true, 1),
            square(2.0, true, 2),
        ]);

        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.5, 0.5, 10.0)), vec![0, 1, 2]);
        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.5, 0.5, -10.0)), vec![2, 1, 0]);
    }

    #[test]
    fn input_order_does_not_change_draw_order() {
        let tree = BspTree::from_polygons(vec![
            square(2.0, true, 2),
            square(0.0, true, 0),
            square(1.0, true, 1),
        ]);

        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.5, 0.5, 10.0)), vec![0, 1, 2]);
        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.5, 0.5, -10.0)), vec![2, 1, 0]);
    }

    #[test]
    fn farther_quad_is_drawn_first() {
        let near = square(0.0, true, 1);
        let far = square(-5.0, true, 2);
        let tree = BspTree::from_polygons(vec![near, far]);

        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.5, 0.5, 10.0)), vec![2, 1]);
    }

    #[test]
    fn coplanar_groups_swap_with_viewpoint() {
        // Splitter 0 with a back subtree (1), a front subtree (2), and one
        // coplanar polygon facing each way (3 flipped, 4 same).
        let tree = BspTree::from_polygons(vec![
            square(0.0, true, 0),
            square(-1.0, true, 1),
            square(1.0, true, 2),
            square(0.0, false, 3),
            square(0.0, true, 4),
        ]);

        let root = tree.root().unwrap();
        assert_eq!(root.coplanar_front().len(), 1);
        assert_eq!(root.coplanar_back().len(), 1);
        assert_eq!(tree.depth(), 2);

        let above = Point3::new(0.5, 0.5, 10.0);
        let below = Point3::new(0.5, 0.5, -10.0);
        assert_eq!(payloads_back_to_front(&tree, above), vec![1, 3, 0, 4, 2]);
        assert_eq!(payloads_back_to_front(&tree, below), vec![2, 4, 0, 3, 1]);
    }

    #[test]
    fn eye_on_root_plane_counts_as_front() {
        let tree = BspTree::from_polygons(vec![square(0.0, true, 0), square(-1.0, true, 1)]);
        assert_eq!(payloads_back_to_front(&tree, Point3::new(5.0, 0.5, 0.0)), vec![1, 0]);
    }

    #[test]
    fn straddling_polygon_is_split_and_interleaved() {
        let tree = BspTree::from_polygons(vec![square(0.0, true, 0), wall(1)]);

        assert_eq!(tree.polygon_count(), 3);
        assert_eq!(tree.stats().splits, 1);
        assert_eq!(tree.stats().dropped_fragments, 0);

        let fragment_area: f32 = tree
            .iter()
            .filter(|p| *p.payload() == 1)
            .map(|p| p.area())
            .sum();
        assert!((fragment_area - wall(1).area()).abs() < 1e-5);

        // From above, the lower half of the wall is hidden by the square and
        // the upper half covers it.
        assert_eq!(payloads_back_to_front(&tree, Point3::new(2.0, 0.5, 5.0)), vec![1, 0, 1]);
    }

    #[test]
    fn no_polygon_is_lost() {
        let tree = BspTree::from_polygons(tangled_scene());
        let stats = *tree.stats();
        assert_eq!(stats.input_polygons, 8);
        assert_eq!(
            tree.polygon_count(),
            stats.input_polygons + stats.splits - stats.dropped_fragments
        );

        let mut stored: Vec<u32> = tree.iter().map(|p| *p.payload()).collect();
        stored.sort_unstable();

        for eye in eyes() {
            let mut visited = payloads_back_to_front(&tree, eye);
            visited.sort_unstable();
            assert_eq!(visited, stored);
        }

        let mut unique = stored.clone();
        unique.dedup();
        assert_eq!(unique, (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn partition_invariant_holds() {
        fn check(node: &BspNode<u32>) {
            let plane = node.plane();
            for polygon in node.polygons() {
                for v in polygon.vertices() {
                    assert!(plane.signed_distance(*v).abs() <= 1e-4);
                }
            }

            let mut front = Vec::new();
            subtree_polygons(node.front(), &mut front);
            for polygon in front {
                for v in polygon.vertices() {
                    assert!(plane.signed_distance(*v) >= -1e-4);
                }
            }

            let mut back = Vec::new();
            subtree_polygons(node.back(), &mut back);
            for polygon in back {
                for v in polygon.vertices() {
                    assert!(plane.signed_distance(*v) <= 1e-4);
                }
            }

            if let Some(front) = node.front() {
                check(front);
            }
            if let Some(back) = node.back() {
                check(back);
            }
        }

        for selector_tree in [
            BspTree::from_polygons(tangled_scene()),
            BspTree::build(tangled_scene(), &FewestSplits::default(), &BuildConfig::default()),
        ] {
            assert!(selector_tree.stats().splits > 0);
            check(selector_tree.root().unwrap());
        }
    }

    #[test]
    fn nothing_drawn_later_is_hidden_behind_something_drawn_earlier() {
        let tree = BspTree::from_polygons(tangled_scene());

        for eye in eyes() {
            let order = tree.draw_order(eye);
            for (j, later) in order.iter().enumerate() {
                let centroid = later.centroid();
                let samples = std::iter::once(centroid)
                    .chain(later.vertices().iter().map(|v| centroid + (v - centroid) * 0.8));

                for sample in samples {
                    let ray = sample - eye;
                    for earlier in &order[..j] {
                        let normal = earlier.normal();
                        let denom = normal.dot(&ray);
                        if denom.abs() < 1e-6 {
                            continue;
                        }
                        let t = -earlier.plane().signed_distance(eye) / denom;
                        if t <= 0.0 || t >= 1.0 - 1e-3 {
                            continue;
                        }
                        let hit = eye + ray * t;
                        assert!(
                            !strictly_inside(*earlier, hit, 1e-3),
                            "polygon {} drawn before {} but occludes it from {:?}",
                            earlier.payload(),
                            later.payload(),
                            eye
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn front_to_back_is_exact_reverse() {
        let tree = BspTree::from_polygons(tangled_scene());

        for eye in eyes() {
            let back_to_front: Vec<*const Polygon<u32>> = tree
                .draw_order(eye)
                .into_iter()
                .map(|p| p as *const Polygon<u32>)
                .collect();

            let mut front_to_back = Vec::new();
            let mut visitor = FnVisitor::new(|p: &Polygon<u32>| {
                front_to_back.push(p as *const Polygon<u32>);
                ControlFlow::Continue(())
            });
            assert!(tree.traverse_front_to_back(eye, &mut visitor).is_continue());

            front_to_back.reverse();
            assert_eq!(front_to_back, back_to_front);
        }
    }

    #[test]
    fn root_groups_reverse_across_root_plane() {
        let tree = BspTree::from_polygons(tangled_scene());
        let root = tree.root().unwrap();

        let mut front_group = Vec::new();
        subtree_polygons(root.front(), &mut front_group);
        let mut back_group = Vec::new();
        subtree_polygons(root.back(), &mut back_group);
        assert!(!front_group.is_empty() && !back_group.is_empty());

        let center = root.splitter().centroid();
        let normal = root.plane().normal();
        let position = |order: &[&Polygon<u32>], target: &Polygon<u32>| {
            order
                .iter()
                .position(|p| std::ptr::eq(*p, target))
                .unwrap()
        };

        let from_front = tree.draw_order(center + normal * 20.0);
        let from_back = tree.draw_order(center - normal * 20.0);
        let splitter = root.splitter();

        let split_front = position(&from_front, splitter);
        let split_back = position(&from_back, splitter);
        assert_eq!(split_front, back_group.len() + root.coplanar_back().len());
        assert_eq!(split_back, front_group.len() + root.coplanar_front().len());

        for &p in &back_group {
            assert!(position(&from_front, p) < split_front);
            assert!(position(&from_back, p) > split_back);
        }
        for &p in &front_group {
            assert!(position(&from_front, p) > split_front);
            assert!(position(&from_back, p) < split_back);
        }
    }

    #[test]
    fn traversal_is_repeatable() {
        let tree = BspTree::from_polygons(tangled_scene());
        let eye = Point3::new(1.0, -2.0, 4.0);

        let first: Vec<*const Polygon<u32>> =
            tree.draw_order(eye).into_iter().map(|p| p as *const _).collect();
        let second: Vec<*const Polygon<u32>> =
            tree.draw_order(eye).into_iter().map(|p| p as *const _).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn visitor_can_stop_early() {
        let tree = BspTree::from_polygons(tangled_scene());
        let mut visited = 0;
        let mut visitor = FnVisitor::new(|_: &Polygon<u32>| {
            visited += 1;
            if visited == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        let flow = tree.traverse_back_to_front(Point3::new(0.0, 0.0, 10.0), &mut visitor);
        assert!(flow.is_break());
        assert_eq!(visited, 3);
    }

    #[test]
    fn for_each_matches_draw_order() {
        let tree = BspTree::from_polygons(tangled_scene());
        let eye = Point3::new(-3.0, 1.0, 2.0);

        let mut seen = Vec::new();
        tree.for_each_back_to_front(eye, |p| seen.push(*p.payload()));
        let expected: Vec<u32> = tree.draw_order(eye).into_iter().map(|p| *p.payload()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn tiny_input_polygons_are_filtered() {
        let config = BuildConfig::default().with_min_fragment_area(0.5);
        let tiny = Polygon::new(
            vec![
                Point3::new(0.0, 0.0, 3.0),
                Point3::new(0.5, 0.0, 3.0),
                Point3::new(0.0, 0.5, 3.0),
            ],
            7,
        )
        .unwrap();

        let tree = BspTree::build(vec![tiny, square(0.0, true, 1)], &FirstPolygon, &config);
        assert_eq!(tree.stats().filtered_polygons, 1);
        assert_eq!(tree.polygon_count(), 1);
        assert_eq!(*tree.root().unwrap().splitter().payload(), 1);
    }

    #[test]
    fn duplicates_share_a_node() {
        let tree = BspTree::from_polygons(vec![square(0.0, true, 1), square(0.0, true, 1)]);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.root().unwrap().coplanar_front().len(), 1);
        assert_eq!(payloads_back_to_front(&tree, Point3::new(0.0, 0.0, 1.0)), vec![1, 1]);
    }

    #[test]
    fn into_polygons_returns_everything() {
        let tree = BspTree::from_polygons(vec![square(0.0, true, 0), wall(1)]);
        let mut ids: Vec<u32> = tree.into_polygons().into_iter().map(Polygon::into_payload).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 1]);
    }

    #[test]
    fn stats_track_tree_shape() {
        let tree = BspTree::from_polygons(tangled_scene());
        assert_eq!(tree.stats().nodes, tree.root().unwrap().node_count());
        assert_eq!(tree.stats().depth, tree.depth());
    }

    #[test]
    fn concurrent_traversals_agree() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BspTree<u32>>();

        let tree = BspTree::from_polygons(tangled_scene());
        let eye = Point3::new(2.0, 3.0, 4.0);
        let expected: Vec<u32> = tree.draw_order(eye).into_iter().map(|p| *p.payload()).collect();

        let tree = &tree;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        tree.draw_order(eye)
                            .into_iter()
                            .map(|p| *p.payload())
                            .collect::<Vec<u32>>()
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    fn pixel_layer(
        degrees: f32,
        offset: Vector3<f32>,
        origin: Point2<f32>,
        size: Vector2<f32>,
        id: u32,
    ) -> Polygon<u32> {
        let transform = Translation3::from(offset).to_homogeneous()
            * Rotation3::from_axis_angle(&Vector3::y_axis(), degrees.to_radians()).to_homogeneous();
        Polygon::from_transformed_rect(origin, size, &transform, id).unwrap()
    }

    #[test]
    fn pixel_space_layers_are_ordered() {
        let size = Vector2::new(512.0, 384.0);
        let layers: Vec<Polygon<u32>> = [0.0, -100.0, -200.0]
            .into_iter()
            .enumerate()
            .map(|(id, z)| {
                let offset = Vector3::new(400.0, 300.0, z);
                pixel_layer(30.0, offset, Point2::origin(), size, id as u32)
            })
            .collect();

        let tree = BspTree::from_polygons(layers);
        assert_eq!(tree.stats().splits, 0);
        assert_eq!(tree.polygon_count(), 3);

        let normal = Vector3::new(30.0_f32.to_radians().sin(), 0.0, 30.0_f32.to_radians().cos());
        let center = Point3::new(400.0, 300.0, 0.0);
        assert_eq!(payloads_back_to_front(&tree, center + normal * 2000.0), vec![2, 1, 0]);
        assert_eq!(payloads_back_to_front(&tree, center - normal * 2000.0), vec![0, 1, 2]);
    }

    #[test]
    fn coplanar_pixel_layers_share_a_node() {
        let offset = Vector3::new(400.0, 300.0, 0.0);
        let backdrop = pixel_layer(30.0, offset, Point2::origin(), Vector2::new(512.0, 384.0), 0);
        let badge = pixel_layer(30.0, offset, Point2::new(100.0, 50.0), Vector2::new(200.0, 100.0), 1);

        let tree = BspTree::from_polygons(vec![backdrop, badge]);
        assert_eq!(tree.stats().splits, 0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.root().unwrap().coplanar_front().len(), 1);
    }

    #[test]
    fn crossing_pixel_layers_split_cleanly() {
        let offset = Vector3::new(400.0, 300.0, 0.0);
        let origin = Point2::new(-256.0, -192.0);
        let size = Vector2::new(512.0, 384.0);
        let left = pixel_layer(30.0, offset, origin, size, 0);
        let right = pixel_layer(-30.0, offset, origin, size, 1);
        let right_area = right.area();

        let tree = BspTree::from_polygons(vec![left, right]);
        assert_eq!(tree.stats().splits, 1);
        assert_eq!(tree.stats().dropped_fragments, 0);
        assert_eq!(tree.polygon_count(), 3);

        let fragment_area: f32 = tree.iter().filter(|p| *p.payload() == 1).map(|p| p.area()).sum();
        assert!((fragment_area / right_area - 1.0).abs() < 1e-4);

        let eye = Point3::new(400.0, 300.0, 2000.0);
        let mut order = payloads_back_to_front(&tree, eye);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 1]);
    }

    #[test]
    fn traversal_classifies_eye_with_build_epsilon() {
        let polygons = || vec![square(0.0, true, 0), square(-1.0, true, 1)];
        let eye = Point3::new(0.5, 0.5, -0.05);

        let strict = BspTree::from_polygons(polygons());
        assert_eq!(payloads_back_to_front(&strict, eye), vec![0, 1]);

        let config = BuildConfig::default().with_plane_epsilon(0.1);
        let loose = BspTree::build(polygons(), &FirstPolygon, &config);
        assert_eq!(loose.config().plane_epsilon, 0.1);
        assert_eq!(payloads_back_to_front(&loose, eye), vec![1, 0]);
    }
}
