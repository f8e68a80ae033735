use itertools::Itertools;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    stable_graph::StableUnGraph,
    visit::EdgeRef,
};

/// An edge of an undirected multigraph together with a direction
///
/// The plain orientation runs from the first to the second endpoint
/// the edge was created with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrientedEdge {
    pub id: EdgeIndex,
    pub reversed: bool,
}

impl OrientedEdge {
    pub fn new(id: EdgeIndex) -> Self {
        Self { id, reversed: false }
    }

    pub fn reverse(self) -> Self {
        Self { id: self.id, reversed: !self.reversed }
    }
}

/// Undirected multigraph with loops and stable indices
#[derive(Clone, Debug)]
pub(crate) struct Multigraph<E> {
    graph: StableUnGraph<(), E>,
}

impl<E> Default for Multigraph<E> {
    fn default() -> Self {
        Self { graph: StableUnGraph::default() }
    }
}

impl<E> Multigraph<E> {
    pub(crate) fn add_node(&mut self) -> NodeIndex {
        self.graph.add_node(())
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, weight: E) -> EdgeIndex {
        self.graph.add_edge(source, target, weight)
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeIndex) -> Option<E> {
        self.graph.remove_edge(e)
    }

    pub(crate) fn remove_node(&mut self, v: NodeIndex) -> bool {
        self.graph.remove_node(v).is_some()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn contains_node(&self, v: NodeIndex) -> bool {
        self.graph.contains_node(v)
    }

    pub(crate) fn contains_edge(&self, e: EdgeIndex) -> bool {
        self.graph.edge_weight(e).is_some()
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub(crate) fn weight(&self, e: EdgeIndex) -> Option<&E> {
        self.graph.edge_weight(e)
    }

    pub(crate) fn weight_mut(&mut self, e: EdgeIndex) -> Option<&mut E> {
        self.graph.edge_weight_mut(e)
    }

    pub(crate) fn endpoints(&self, e: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(e)
    }

    pub(crate) fn source(&self, e: OrientedEdge) -> Option<NodeIndex> {
        let (s, t) = self.endpoints(e.id)?;
        Some(if e.reversed { t } else { s })
    }

    pub(crate) fn target(&self, e: OrientedEdge) -> Option<NodeIndex> {
        let (s, t) = self.endpoints(e.id)?;
        Some(if e.reversed { s } else { t })
    }

    /// Incident edges oriented away from `v`, in order of creation
    ///
    /// Each loop is listed once in its plain orientation.
    pub(crate) fn incidences(&self, v: NodeIndex) -> Vec<OrientedEdge> {
        let mut ids = Vec::from_iter(self.graph.edges(v).map(|e| e.id()).unique());
        ids.sort_unstable();
        Vec::from_iter(ids.into_iter().filter_map(|id| {
            let (s, _) = self.endpoints(id)?;
            Some(OrientedEdge { id, reversed: s != v })
        }))
    }

    /// Like [Self::incidences], but loops appear in both orientations
    pub(crate) fn all_incidences(&self, v: NodeIndex) -> Vec<OrientedEdge> {
        let mut res = Vec::new();
        for e in self.incidences(v) {
            res.push(e);
            if self.target(e) == Some(v) {
                res.push(e.reverse());
            }
        }
        res
    }

    /// Edges running from `source` to `target`
    pub(crate) fn directed_edges(&self, source: NodeIndex, target: NodeIndex) -> Vec<OrientedEdge> {
        Vec::from_iter(
            self.all_incidences(source)
                .into_iter()
                .filter(|&e| self.target(e) == Some(target)),
        )
    }

    pub(crate) fn degree(&self, v: NodeIndex) -> usize {
        self.all_incidences(v).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loops_and_orientation() {
        let mut g = Multigraph::default();
        let a = g.add_node();
        let b = g.add_node();
        let ab = g.add_edge(a, b, 1);
        let aa = g.add_edge(a, a, 2);
        let ba = g.add_edge(b, a, 3);

        let inc = g.incidences(a);
        assert_eq!(
            inc,
            vec![
                OrientedEdge::new(ab),
                OrientedEdge::new(aa),
                OrientedEdge::new(ba).reverse()
            ]
        );
        assert_eq!(g.all_incidences(a).len(), 4);
        assert_eq!(g.degree(a), 4);
        assert_eq!(g.degree(b), 2);
        assert_eq!(g.directed_edges(a, b).len(), 2);
        assert_eq!(g.directed_edges(a, a).len(), 2);
        assert_eq!(g.source(OrientedEdge::new(ba).reverse()), Some(a));
        assert_eq!(g.target(OrientedEdge::new(ba).reverse()), Some(b));

        assert_eq!(g.remove_edge(aa), Some(2));
        assert!(!g.contains_edge(aa));
        assert_eq!(g.degree(a), 2);
        assert!(g.contains_node(b));
    }
}
