use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display};
use std::rc::Rc;

use itertools::Itertools;
use log::debug;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::cache::Cache;
use crate::error::{PeriodicGraphError, Result};
use crate::geometry::Vector;
use crate::matrix::Matrix;
use crate::multigraph::{Multigraph, OrientedEdge};

type HashMap<K, V> = ahash::AHashMap<K, V>;
type HashSet<K> = ahash::AHashSet<K>;

/// Default bound on the number of visited nodes in cycle searches
pub const DEFAULT_CYCLE_LIMIT: usize = 1_000_000;

/// A periodic graph
///
/// The infinite graph is represented by a finite quotient multigraph
/// in which every edge carries an integer shift vector. An edge from
/// `v` to `w` with shift `s` connects the copy of `v` in the unit
/// cell at the origin to the copy of `w` in the cell at `s`. The
/// shift is stored for the orientation the edge was created with and
/// negated for the reverse.
///
/// Derived data like the barycentric placement, the symmetry group
/// and the invariant are computed on demand and cached until the
/// next mutation.
///
/// # Example
///
/// ```rust
/// use pgraph_canon::prelude::*;
///
/// // the honeycomb net
/// let mut g = PeriodicGraph::new(2);
/// let v = g.add_node();
/// let w = g.add_node();
/// g.add_edge(v, w, &[0, 0]).unwrap();
/// g.add_edge(v, w, &[1, 0]).unwrap();
/// g.add_edge(v, w, &[0, 1]).unwrap();
///
/// assert!(g.is_connected().unwrap());
/// assert_eq!(g.systre_key().unwrap(), "2 1 2 0 0 1 2 0 1 1 2 1 0");
/// ```
#[derive(Clone, Debug)]
pub struct PeriodicGraph {
    dim: usize,
    graph: Multigraph<Vec<i64>>,
    version: u64,
    pub(crate) cache: Cache,
}

impl PeriodicGraph {
    /// Creates an empty periodic graph of the given dimension
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            graph: Multigraph::default(),
            version: 0,
            cache: Cache::default(),
        }
    }

    /// Builds a graph with `nodes` nodes and the given edges, where
    /// nodes are referred to by their zero-based position.
    pub fn from_edges<I, S>(dim: usize, nodes: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, S)>,
        S: AsRef<[i64]>,
    {
        let mut g = Self::new(dim);
        let nodes = Vec::from_iter((0..nodes).map(|_| g.add_node()));
        for (s, t, shift) in edges {
            let (Some(&s), Some(&t)) = (nodes.get(s), nodes.get(t)) else {
                return Err(PeriodicGraphError::NoSuchNode);
            };
            g.add_edge(s, t, shift.as_ref())?;
        }
        Ok(g)
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    /// All nodes in order of their indices
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.nodes()
    }

    /// All edges in their stored orientation
    pub fn edges(&self) -> impl Iterator<Item = OrientedEdge> + '_ {
        self.graph.edges().map(OrientedEdge::new)
    }

    /// All edges in both orientations
    pub fn directed_edges(&self) -> Vec<OrientedEdge> {
        Vec::from_iter(self.edges().flat_map(|e| [e, e.reverse()]))
    }

    pub fn contains_node(&self, v: NodeIndex) -> bool {
        self.graph.contains_node(v)
    }

    pub fn contains_edge(&self, e: EdgeIndex) -> bool {
        self.graph.contains_edge(e)
    }

    pub(crate) fn first_node(&self) -> Option<NodeIndex> {
        self.nodes().next()
    }

    fn invalidate(&mut self) {
        self.version += 1;
    }

    pub fn add_node(&mut self) -> NodeIndex {
        self.invalidate();
        self.graph.add_node()
    }

    fn check_shift(&self, shift: &[i64]) -> Result<()> {
        if shift.len() != self.dim {
            return Err(PeriodicGraphError::DimensionMismatch {
                expected: self.dim,
                got: shift.len(),
            });
        }
        Ok(())
    }

    /// Adds an edge from `source` to `target` with the given shift
    ///
    /// Fails for loops with zero shift and for edges that already
    /// exist in either orientation.
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        shift: &[i64],
    ) -> Result<OrientedEdge> {
        self.check_shift(shift)?;
        if source == target && shift.iter().all(|&x| x == 0) {
            return Err(PeriodicGraphError::TrivialLoop);
        }
        if self.contains_node(source)
            && self.contains_node(target)
            && self.edge_between(source, target, shift).is_some()
        {
            return Err(PeriodicGraphError::DuplicateEdge);
        }
        self.add_edge_unchecked(source, target, shift)
    }

    /// Adds an edge without testing for duplicates or trivial loops
    pub fn add_edge_unchecked(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        shift: &[i64],
    ) -> Result<OrientedEdge> {
        self.check_shift(shift)?;
        if !self.contains_node(source) || !self.contains_node(target) {
            return Err(PeriodicGraphError::NoSuchNode);
        }
        self.invalidate();
        let id = self.graph.add_edge(source, target, shift.to_vec());
        Ok(OrientedEdge::new(id))
    }

    pub fn remove_edge(&mut self, e: EdgeIndex) -> Result<()> {
        self.graph
            .remove_edge(e)
            .ok_or(PeriodicGraphError::NoSuchEdge)?;
        self.invalidate();
        Ok(())
    }

    /// Removes an isolated node
    pub fn remove_node(&mut self, v: NodeIndex) -> Result<()> {
        if !self.contains_node(v) {
            return Err(PeriodicGraphError::NoSuchNode);
        }
        if self.graph.degree(v) > 0 {
            return Err(PeriodicGraphError::NodeNotIsolated);
        }
        self.graph.remove_node(v);
        self.invalidate();
        Ok(())
    }

    /// Moves the representative of `v` by `amount`
    ///
    /// Shifts of all non-loop edges at `v` are adjusted so that the
    /// infinite graph stays the same. A cached placement is carried
    /// over with the position of `v` moved accordingly.
    pub fn shift_node(&mut self, v: NodeIndex, amount: &[i64]) -> Result<()> {
        self.check_shift(amount)?;
        if !self.contains_node(v) {
            return Err(PeriodicGraphError::NoSuchNode);
        }
        let placement = self.cache.placement.get(self.version);
        for e in self.incidences(v) {
            let (s, t) = self.endpoints(e.id);
            if s == t {
                continue;
            }
            let sign = if s == v { 1 } else { -1 };
            if let Some(shift) = self.graph.weight_mut(e.id) {
                for (x, a) in shift.iter_mut().zip(amount) {
                    *x += sign * a;
                }
            }
        }
        self.invalidate();
        if let Some(placement) = placement {
            let mut placement = (*placement).clone();
            if let Some(p) = placement.get_mut(&v) {
                *p = &*p + &Vector::from_ints(amount);
            }
            self.cache.placement.put(self.version, placement);
        }
        Ok(())
    }

    fn endpoints(&self, id: EdgeIndex) -> (NodeIndex, NodeIndex) {
        match self.graph.endpoints(id) {
            Some(ends) => ends,
            None => panic!("edge {} not in graph", id.index()),
        }
    }

    fn stored_shift(&self, id: EdgeIndex) -> &[i64] {
        match self.graph.weight(id) {
            Some(shift) => shift,
            None => panic!("edge {} not in graph", id.index()),
        }
    }

    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn source(&self, e: OrientedEdge) -> NodeIndex {
        match self.graph.source(e) {
            Some(v) => v,
            None => panic!("edge {} not in graph", e.id.index()),
        }
    }

    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn target(&self, e: OrientedEdge) -> NodeIndex {
        match self.graph.target(e) {
            Some(v) => v,
            None => panic!("edge {} not in graph", e.id.index()),
        }
    }

    pub fn is_loop(&self, e: OrientedEdge) -> bool {
        let (s, t) = self.endpoints(e.id);
        s == t
    }

    /// The shift of `e` in the given orientation
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn shift(&self, e: OrientedEdge) -> Vec<i64> {
        let shift = self.stored_shift(e.id);
        if e.reversed {
            Vec::from_iter(shift.iter().map(|x| -x))
        } else {
            shift.to_vec()
        }
    }

    pub fn shift_vector(&self, e: OrientedEdge) -> Vector {
        Vector::from_ints(&self.shift(e))
    }

    /// Finds the edge from `source` to `target` with the given shift
    pub fn edge_between(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        shift: &[i64],
    ) -> Option<OrientedEdge> {
        self.graph
            .directed_edges(source, target)
            .into_iter()
            .find(|&e| self.shift(e) == shift)
    }

    /// Edges at `v` oriented away from it; loops appear once
    pub fn incidences(&self, v: NodeIndex) -> Vec<OrientedEdge> {
        self.graph.incidences(v)
    }

    /// Edges at `v` oriented away from it; loops appear in both
    /// orientations
    pub fn all_incidences(&self, v: NodeIndex) -> Vec<OrientedEdge> {
        self.graph.all_incidences(v)
    }

    pub fn degree(&self, v: NodeIndex) -> usize {
        self.graph.degree(v)
    }

    pub(crate) fn normalized(&self, e: OrientedEdge) -> (usize, usize, Vec<i64>) {
        let (s, t) = (self.source(e).index(), self.target(e).index());
        let shift = self.shift(e);
        let flip = s > t || (s == t && shift.iter().find(|&&x| x != 0) > Some(&0));
        if flip {
            (t + 1, s + 1, Vec::from_iter(shift.iter().map(|x| -x)))
        } else {
            (s + 1, t + 1, shift)
        }
    }
}

impl Display for PeriodicGraph {
    /// Lists the edges as `(source,target,[shift])` with one-based
    /// node indices
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges = self.edges().map(|e| self.normalized(e)).sorted();
        for (s, t, shift) in edges {
            write!(f, "({s},{t},[{}])", shift.iter().format(","))?;
        }
        Ok(())
    }
}

/// A node of the infinite graph: a quotient node in a given cell
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverNode {
    pub node: NodeIndex,
    pub shift: Vec<i64>,
}

/// An edge of the infinite graph, starting in the cell `shift`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverEdge {
    pub edge: OrientedEdge,
    pub shift: Vec<i64>,
}

impl CoverNode {
    pub fn new(node: NodeIndex, shift: Vec<i64>) -> Self {
        Self { node, shift }
    }
}

impl PeriodicGraph {
    pub fn cover_source(&self, e: &CoverEdge) -> CoverNode {
        CoverNode::new(self.source(e.edge), e.shift.clone())
    }

    pub fn cover_target(&self, e: &CoverEdge) -> CoverNode {
        let shift = self.shift(e.edge);
        CoverNode::new(
            self.target(e.edge),
            Vec::from_iter(e.shift.iter().zip(shift).map(|(a, b)| a + b)),
        )
    }

    pub fn cover_incidences(&self, v: &CoverNode) -> Vec<CoverEdge> {
        Vec::from_iter(self.all_incidences(v.node).into_iter().map(|edge| CoverEdge {
            edge,
            shift: v.shift.clone(),
        }))
    }

    fn cover_neighbours<'a>(&'a self, v: &CoverNode) -> impl Iterator<Item = CoverNode> + 'a {
        self.cover_incidences(v)
            .into_iter()
            .map(move |e| self.cover_target(&e))
    }

    /// Sizes of the shells of nodes at distance 0, 1, 2, ... from `v`
    /// in the infinite graph
    pub fn coordination_sequence(&self, v: NodeIndex) -> CoordinationSequence<'_> {
        CoordinationSequence {
            graph: self,
            previous: HashSet::default(),
            current: HashSet::default(),
            start: Some(CoverNode::new(v, vec![0; self.dim])),
        }
    }

    /// Finds a shortest cycle through the path `u - v - w` in the
    /// infinite graph
    ///
    /// The result starts with `v` and `u` and ends with `w`. Returns
    /// `None` if no cycle is found before `limit` nodes were seen.
    pub fn shortest_cycle_at_angle(
        &self,
        u: &CoverNode,
        v: &CoverNode,
        w: &CoverNode,
        limit: usize,
    ) -> Result<Option<Vec<CoverNode>>> {
        if u == v || v == w || u == w {
            return Err(PeriodicGraphError::DegenerateAngle);
        }
        let mut back = HashMap::default();
        back.insert(v.clone(), v.clone());
        back.insert(w.clone(), v.clone());
        let mut queue = VecDeque::from([w.clone()]);
        while back.len() < limit {
            let Some(s) = queue.pop_front() else {
                break;
            };
            for t in self.cover_neighbours(&s) {
                if t == *u {
                    let mut res = vec![v.clone(), u.clone()];
                    let mut x = s.clone();
                    while x != *v {
                        let next = back[&x].clone();
                        res.push(x);
                        x = next;
                    }
                    return Ok(Some(res));
                }
                if !back.contains_key(&t) {
                    back.insert(t.clone(), s.clone());
                    queue.push_back(t);
                }
            }
        }
        Ok(None)
    }

    /// The Wells point symbol of `v`, for example `6^5.8`
    pub fn point_symbol(&self, v: NodeIndex) -> Result<String> {
        self.point_symbol_with_limit(v, DEFAULT_CYCLE_LIMIT)
    }

    pub fn point_symbol_with_limit(&self, v: NodeIndex, limit: usize) -> Result<String> {
        let centre = CoverNode::new(v, vec![0; self.dim]);
        let neighbours = Vec::from_iter(self.cover_neighbours(&centre));
        let mut counts = BTreeMap::new();
        for (u, w) in neighbours.iter().tuple_combinations() {
            let cycle = self
                .shortest_cycle_at_angle(u, &centre, w, limit)?
                .ok_or(PeriodicGraphError::CycleLimitExceeded { limit })?;
            *counts.entry(cycle.len()).or_insert(0) += 1;
        }
        let symbol = counts
            .into_iter()
            .map(|(n, c)| if c > 1 { format!("{n}^{c}") } else { n.to_string() })
            .join(".");
        Ok(symbol)
    }
}

pub struct CoordinationSequence<'a> {
    graph: &'a PeriodicGraph,
    previous: HashSet<CoverNode>,
    current: HashSet<CoverNode>,
    start: Option<CoverNode>,
}

impl Iterator for CoordinationSequence<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.current.insert(start);
            return Some(1);
        }
        let mut next = HashSet::default();
        for v in &self.current {
            for w in self.graph.cover_neighbours(v) {
                if !self.previous.contains(&w) && !self.current.contains(&w) {
                    next.insert(w);
                }
            }
        }
        self.previous = std::mem::replace(&mut self.current, next);
        Some(self.current.len())
    }
}

/// A connected component of the infinite graph
///
/// `graph` is the component with shifts expressed in terms of
/// `basis`, whose rows span the translations within the component.
/// The multiplicity is the number of pairwise disjoint copies of
/// the component in the infinite graph, or zero if the component has
/// lower dimension than the graph.
#[derive(Clone, Debug)]
pub struct Component {
    graph: PeriodicGraph,
    nodes: Vec<NodeIndex>,
    basis: Matrix,
    multiplicity: BigInt,
}

impl Component {
    pub fn graph(&self) -> &PeriodicGraph {
        &self.graph
    }

    /// The original nodes, in the order of the component's nodes
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn basis(&self) -> &Matrix {
        &self.basis
    }

    pub fn dimension(&self) -> usize {
        self.basis.nrows()
    }

    pub fn multiplicity(&self) -> &BigInt {
        &self.multiplicity
    }
}

impl PeriodicGraph {
    pub fn connected_components(&self) -> Result<Rc<Vec<Component>>> {
        self.cache
            .components
            .get_or_try_init(self.version, || self.compute_components())
    }

    /// Checks whether the infinite graph is connected
    pub fn is_connected(&self) -> Result<bool> {
        let components = self.connected_components()?;
        Ok(match components.as_slice() {
            [] => true,
            [c] => c.multiplicity.is_one(),
            _ => false,
        })
    }

    fn compute_components(&self) -> Result<Vec<Component>> {
        let d = self.dim;
        let mut adjustment: HashMap<NodeIndex, Vector> = HashMap::default();
        let mut res = Vec::new();

        for start in self.nodes() {
            if adjustment.contains_key(&start) {
                continue;
            }
            adjustment.insert(start, Vector::zero(d));
            let mut nodes = vec![start];
            let mut edges = BTreeSet::new();
            let mut translations = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                let av = adjustment[&v].clone();
                for e in self.incidences(v) {
                    edges.insert(e.id);
                    let w = self.target(e);
                    let s = self.shift_vector(e);
                    if let Some(aw) = adjustment.get(&w) {
                        let t = &(&s + aw) - &av;
                        if !t.is_zero() {
                            translations.push(t);
                        }
                    } else {
                        adjustment.insert(w, &av - &s);
                        nodes.push(w);
                        queue.push_back(w);
                    }
                }
            }

            let mut lattice = Matrix::from_rows(
                d,
                translations.iter().map(|t| t.coords().to_vec()),
            );
            lattice.triangulate(None, true, true);
            let rank = lattice
                .rows()
                .take_while(|row| row.iter().any(|x| !x.is_zero()))
                .count();
            let basis = lattice.sub_matrix(0, 0, rank, d);
            let multiplicity = if rank < d {
                BigInt::zero()
            } else {
                basis.determinant().to_integer()
            };

            let to_basis = basis
                .extended_to_basis()
                .inverse()
                .ok_or(PeriodicGraphError::Internal("singular component basis"))?;
            let mut graph = PeriodicGraph::new(rank);
            let new_nodes: HashMap<_, _> =
                nodes.iter().map(|&v| (v, graph.add_node())).collect();
            for id in edges {
                let e = OrientedEdge::new(id);
                let (v, w) = (self.source(e), self.target(e));
                let t = &(&self.shift_vector(e) + &adjustment[&w]) - &adjustment[&v];
                let coords = t.times(&to_basis).coords()[..rank].to_vec();
                let shift = Vector::new(coords)
                    .to_ints()
                    .ok_or(PeriodicGraphError::Internal("non-integral component shift"))?;
                graph.add_edge_unchecked(new_nodes[&v], new_nodes[&w], &shift)?;
            }
            debug!(
                "Component with {} nodes, dimension {rank}, multiplicity {multiplicity}",
                nodes.len()
            );
            res.push(Component { graph, nodes, basis, multiplicity });
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::NetSpec;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub(crate) fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    fn node(g: &PeriodicGraph, i: usize) -> NodeIndex {
        g.nodes().nth(i).unwrap()
    }

    #[test]
    fn edge_checks() {
        log_init();
        let mut g = PeriodicGraph::new(3);
        let v = g.add_node();
        let w = g.add_node();
        let e = g.add_edge(v, w, &[1, 0, 0]).unwrap();
        assert_eq!(g.source(e), v);
        assert_eq!(g.target(e.reverse()), v);
        assert_eq!(g.shift(e.reverse()), vec![-1, 0, 0]);
        assert_eq!(
            g.add_edge(w, v, &[-1, 0, 0]),
            Err(PeriodicGraphError::DuplicateEdge)
        );
        assert_eq!(g.add_edge(v, v, &[0, 0, 0]), Err(PeriodicGraphError::TrivialLoop));
        assert!(matches!(
            g.add_edge(v, w, &[0, 0]),
            Err(PeriodicGraphError::DimensionMismatch { expected: 3, got: 2 })
        ));
        let l = g.add_edge(v, v, &[0, 1, 0]).unwrap();
        assert_eq!(g.add_edge(v, v, &[0, -1, 0]), Err(PeriodicGraphError::DuplicateEdge));
        assert!(g.add_edge_unchecked(v, v, &[0, -1, 0]).is_ok());
        assert_eq!(g.edge_between(v, v, &[0, -1, 0]).map(|e| e.id), Some(l.id));
        assert_eq!(g.degree(v), 5);
        assert_eq!(g.remove_node(v), Err(PeriodicGraphError::NodeNotIsolated));
    }

    #[test]
    #[should_panic]
    fn removed_edge_source() {
        let mut g = build(&testing::hcb());
        let e = g.edges().next().unwrap();
        assert_eq!(g.source(e.reverse()), g.target(e));
        g.remove_edge(e.id).unwrap();
        g.source(e);
    }

    #[test]
    fn display() {
        let g = build(&testing::cds_primitive());
        assert_eq!(
            g.to_string(),
            "(1,1,[0,0,-1])(1,2,[0,0,0])(1,2,[0,1,0])(2,2,[-1,0,0])"
        );
    }

    #[test]
    fn shift_node() {
        log_init();
        let mut g = build(&testing::dia());
        let key = g.systre_key().unwrap();
        g.barycentric_placement().unwrap();
        let v = node(&g, 1);
        g.shift_node(v, &[1, -1, 0]).unwrap();
        let p = g.barycentric_placement().unwrap();
        assert!(g.is_barycentric(&p));
        assert_eq!(g.systre_key().unwrap(), key);
        let u = node(&g, 0);
        assert!(g.edge_between(u, v, &[-1, 1, 0]).is_some());
    }

    #[test]
    fn removal() {
        let mut g = build(&testing::hcb());
        let v = node(&g, 0);
        let e = g.incidences(v)[0];
        assert!(g.is_connected().unwrap());
        g.remove_edge(e.id).unwrap();
        assert!(!g.is_connected().unwrap());
        assert_eq!(g.remove_edge(e.id), Err(PeriodicGraphError::NoSuchEdge));
        let x = g.add_node();
        g.remove_node(x).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn connectivity() {
        log_init();
        let mut g = PeriodicGraph::new(3);
        let v = g.add_node();
        let w = g.add_node();
        assert!(!g.is_connected().unwrap());
        g.add_edge(v, w, &[1, 0, 0]).unwrap();
        g.add_edge(v, w, &[0, 1, 0]).unwrap();
        g.add_edge(v, w, &[0, 0, 1]).unwrap();
        assert!(!g.is_connected().unwrap());
        g.add_edge(v, w, &[3, 0, 0]).unwrap();
        assert!(!g.is_connected().unwrap());
        g.add_edge(v, w, &[2, 0, 0]).unwrap();
        assert!(g.is_connected().unwrap());
        assert!(PeriodicGraph::new(2).is_connected().unwrap());
    }

    #[test]
    fn components() {
        log_init();
        let mut g = PeriodicGraph::new(3);
        let v = g.add_node();
        let w = g.add_node();
        let comps = g.connected_components().unwrap();
        assert_eq!(comps.len(), 2);
        for c in comps.iter() {
            assert_eq!(c.dimension(), 0);
            assert!(c.multiplicity().is_zero());
            assert_eq!(c.graph().node_count(), 1);
        }

        g.add_edge(v, w, &[1, 0, 0]).unwrap();
        g.add_edge(v, w, &[0, 1, 0]).unwrap();
        g.add_edge(v, w, &[0, 0, 1]).unwrap();
        let comps = g.connected_components().unwrap();
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        assert_eq!(c.dimension(), 2);
        assert!(c.multiplicity().is_zero());
        let hcb = build(&testing::hcb());
        assert_eq!(c.graph().invariant().unwrap(), hcb.invariant().unwrap());

        g.add_edge(v, w, &[2, 1, 0]).unwrap();
        let comps = g.connected_components().unwrap();
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        assert_eq!(c.dimension(), 3);
        assert_eq!(c.multiplicity(), &BigInt::from(2));
        let dia = build(&testing::dia());
        assert_eq!(c.graph().invariant().unwrap(), dia.invariant().unwrap());
    }

    #[test]
    fn coordination_sequence() {
        log_init();
        let dia = build(&testing::dia());
        let seq = Vec::from_iter(dia.coordination_sequence(node(&dia, 0)).take(11));
        assert_eq!(seq, [1, 4, 12, 24, 42, 64, 92, 124, 162, 204, 252]);

        let pcu = build(&testing::pcu());
        let seq = Vec::from_iter(pcu.coordination_sequence(node(&pcu, 0)).take(4));
        assert_eq!(seq, [1, 6, 18, 38]);
    }

    #[test]
    fn point_symbols() {
        log_init();
        let dia = build(&testing::dia());
        assert_eq!(dia.point_symbol(node(&dia, 0)).unwrap(), "6^6");
        let cds = build(&testing::cds());
        assert_eq!(cds.point_symbol(node(&cds, 0)).unwrap(), "6^5.8");
        let hcb = build(&testing::hcb());
        assert_eq!(hcb.point_symbol(node(&hcb, 0)).unwrap(), "6^3");
        let pcu = build(&testing::pcu());
        assert_eq!(pcu.point_symbol(node(&pcu, 0)).unwrap(), "4^12.6^3");
    }

    #[test]
    fn angle_cycle() {
        let hcb = build(&testing::hcb());
        let v = CoverNode::new(node(&hcb, 0), vec![0, 0]);
        let nb = Vec::from_iter(hcb.cover_neighbours(&v));
        let cycle = hcb
            .shortest_cycle_at_angle(&nb[0], &v, &nb[1], DEFAULT_CYCLE_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(cycle.len(), 6);
        assert_eq!(cycle[0], v);
        assert_eq!(cycle[1], nb[0]);
        assert_eq!(cycle[5], nb[1]);
        assert_eq!(
            hcb.shortest_cycle_at_angle(&v, &v, &nb[1], 10),
            Err(PeriodicGraphError::DegenerateAngle)
        );
        assert_eq!(
            hcb.shortest_cycle_at_angle(&nb[0], &v, &nb[1], 3),
            Ok(None)
        );
    }
}
