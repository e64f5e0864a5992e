//! Visitors receive polygons one at a time during a tree walk.

use std::ops::ControlFlow;

use crate::Polygon;

/// Receives polygons in draw order.
///
/// `visit` is called exactly once for every polygon or split fragment stored
/// in the tree. Returning [`ControlFlow::Break`] ends the walk without
/// visiting anything further.
///
/// Fragments of one input polygon share its payload but are otherwise
/// distinct; a visitor should rely on nothing but the payload to identify
/// where a polygon came from.
pub trait BspVisitor<P> {
    fn visit(&mut self, polygon: &Polygon<P>) -> ControlFlow<()>;
}

/// Collects clones of every visited polygon.
#[derive(Debug)]
pub struct CollectingVisitor<P> {
    collected: Vec<Polygon<P>>,
}

impl<P> Default for CollectingVisitor<P> {
    fn default() -> Self {
        Self {
            collected: Vec::new(),
        }
    }
}

impl<P: Clone> CollectingVisitor<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> &[Polygon<P>] {
        &self.collected
    }

    pub fn into_polygons(self) -> Vec<Polygon<P>> {
        self.collected
    }

    /// Payloads of the collected polygons, in visit order.
    pub fn payloads(&self) -> Vec<P> {
        self.collected.iter().map(|p| p.payload().clone()).collect()
    }
}

impl<P: Clone> BspVisitor<P> for CollectingVisitor<P> {
    fn visit(&mut self, polygon: &Polygon<P>) -> ControlFlow<()> {
        self.collected.push(polygon.clone());
        ControlFlow::Continue(())
    }
}

/// Adapts a closure into a visitor.
pub struct FnVisitor<F> {
    func: F,
}

impl<F> FnVisitor<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<P, F> BspVisitor<P> for FnVisitor<F>
where
    F: FnMut(&Polygon<P>) -> ControlFlow<()>,
{
    fn visit(&mut self, polygon: &Polygon<P>) -> ControlFlow<()> {
        (self.func)(polygon)
    }
}
