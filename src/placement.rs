use std::rc::Rc;

use num_traits::One;
use petgraph::graph::NodeIndex;

use crate::error::{PeriodicGraphError, Result};
use crate::geometry::{Point, Vector};
use crate::matrix::{int, Matrix, Rational};
use crate::multigraph::OrientedEdge;
use crate::periodic::PeriodicGraph;

type HashMap<K, V> = ahash::AHashMap<K, V>;
type HashSet<K> = ahash::AHashSet<K>;

/// Node positions
pub type Placement = ahash::AHashMap<NodeIndex, Point>;

impl PeriodicGraph {
    /// The barycentric placement with the first node at the origin
    ///
    /// Every node sits at the average position of its neighbours in
    /// the infinite graph. Loops do not contribute.
    pub fn barycentric_placement(&self) -> Result<Rc<Placement>> {
        if !self.is_connected()? {
            return Err(PeriodicGraphError::Disconnected);
        }
        self.cache
            .placement
            .get_or_try_init(self.version(), || self.compute_placement())
    }

    fn compute_placement(&self) -> Result<Placement> {
        let d = self.dimension();
        let nodes = Vec::from_iter(self.nodes());
        let n = nodes.len();
        if n == 0 {
            return Ok(Placement::default());
        }
        let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut lhs = Matrix::zero(n + 1, n);
        let mut rhs = Matrix::zero(n + 1, d);
        let one = Rational::one();
        for (i, &v) in nodes.iter().enumerate() {
            for e in self.incidences(v) {
                let w = self.target(e);
                if w == v {
                    continue;
                }
                lhs.add_to(i, index[&w], &-&one);
                lhs.add_to(i, i, &one);
                for (k, x) in self.shift(e).into_iter().enumerate() {
                    rhs.add_to(i, k, &int(x));
                }
            }
        }
        lhs.set(n, 0, one);

        let solution = Matrix::solve(&lhs, &rhs)
            .ok_or(PeriodicGraphError::Internal("inconsistent barycentric equations"))?;
        Ok(nodes
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, Point::new(solution.row(i).to_vec())))
            .collect())
    }

    /// Checks whether every node sits at the centre of gravity of its
    /// neighbours
    pub fn is_barycentric(&self, placement: &Placement) -> bool {
        let zero = Vector::zero(self.dimension());
        self.nodes().all(|v| {
            let mut total = zero.clone();
            for e in self.incidences(v) {
                if self.is_loop(e) {
                    continue;
                }
                let Some(diff) = difference(self, placement, e) else {
                    return false;
                };
                total = &total + &diff;
            }
            total.is_zero()
        })
    }

    pub fn position(&self, v: NodeIndex) -> Result<Point> {
        self.barycentric_placement()?
            .get(&v)
            .cloned()
            .ok_or(PeriodicGraphError::NoSuchNode)
    }

    /// The vector from the source to the target of `e` in the
    /// barycentric placement
    pub fn difference_vector(&self, e: OrientedEdge) -> Result<Vector> {
        let placement = self.barycentric_placement()?;
        difference(self, &placement, e).ok_or(PeriodicGraphError::NoSuchEdge)
    }

    /// Difference vectors of `edges` as the rows of a matrix
    pub fn difference_matrix(&self, edges: &[OrientedEdge]) -> Result<Matrix> {
        let placement = self.barycentric_placement()?;
        let rows = edges
            .iter()
            .map(|&e| {
                difference(self, &placement, e)
                    .map(|v| v.coords().to_vec())
                    .ok_or(PeriodicGraphError::NoSuchEdge)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix::from_rows(self.dimension(), rows))
    }

    /// Checks that no two nodes share a position modulo the lattice
    pub fn is_stable(&self) -> Result<bool> {
        let placement = self.barycentric_placement()?;
        self.cache.stable.get_or_try_init(self.version(), || {
            let mut seen = HashSet::default();
            Ok(placement.values().all(|p| seen.insert(p.mod_z())))
        }).map(|s| *s)
    }

    /// Checks that the neighbours of each node in the infinite graph
    /// have pairwise distinct positions
    ///
    /// Loops count in both directions.
    pub fn is_locally_stable(&self) -> Result<bool> {
        let placement = self.barycentric_placement()?;
        self.cache
            .locally_stable
            .get_or_try_init(self.version(), || {
                let res = self.nodes().all(|v| {
                    let mut seen = HashSet::default();
                    self.all_incidences(v).into_iter().all(|e| {
                        let pos = &placement[&self.target(e)] + &self.shift_vector(e);
                        seen.insert(pos)
                    })
                });
                Ok(res)
            })
            .map(|s| *s)
    }

    /// Fails unless the graph is connected and locally stable
    pub(crate) fn require_locally_stable(&self) -> Result<()> {
        if !self.is_connected()? {
            return Err(PeriodicGraphError::Disconnected);
        }
        if !self.is_locally_stable()? {
            return Err(PeriodicGraphError::NotLocallyStable);
        }
        Ok(())
    }
}

pub(crate) fn difference(g: &PeriodicGraph, placement: &Placement, e: OrientedEdge) -> Option<Vector> {
    let p = placement.get(&g.source(e))?;
    let q = placement.get(&g.target(e))?;
    Some(&(q - p) + &g.shift_vector(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::NetSpec;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    fn q(n: i64, d: i64) -> Rational {
        Rational::new(n.into(), d.into())
    }

    #[test]
    fn dia_positions() {
        log_init();
        let g = build(&testing::dia());
        let p = g.barycentric_placement().unwrap();
        assert!(g.is_barycentric(&p));
        let nodes = Vec::from_iter(g.nodes());
        assert_eq!(p[&nodes[0]], Point::origin(3));
        assert_eq!(p[&nodes[1]], Point::new(vec![q(1, 4), q(1, 4), q(1, 4)]));
        let e = g.incidences(nodes[0])[1];
        assert_eq!(
            g.difference_vector(e).unwrap(),
            Vector::new(vec![q(-3, 4), q(1, 4), q(1, 4)])
        );
        assert!(g.is_stable().unwrap());
        assert!(g.is_locally_stable().unwrap());
    }

    #[test]
    fn unstable() {
        log_init();
        let g = build(&testing::double_hcb());
        assert!(!g.is_stable().unwrap());
        assert!(g.is_locally_stable().unwrap());

        let g = build(
            &NetSpec::new(3, 3)
                .edge(0, 1, &[0, 0, 0])
                .edge(0, 2, &[0, 0, 0])
                .edge(0, 0, &[1, 0, 0])
                .edge(0, 0, &[0, 1, 0])
                .edge(0, 0, &[0, 0, 1])
        );
        assert!(!g.is_locally_stable().unwrap());
        assert!(!g.is_stable().unwrap());
    }

    #[test]
    fn parallel_loops() {
        let mut g = PeriodicGraph::new(1);
        let v = g.add_node();
        g.add_edge(v, v, &[1]).unwrap();
        assert!(g.is_connected().unwrap());
        assert!(g.is_locally_stable().unwrap());
        g.add_edge_unchecked(v, v, &[1]).unwrap();
        assert!(g.is_connected().unwrap());
        assert!(!g.is_locally_stable().unwrap());
    }

    #[test]
    fn disconnected() {
        let mut g = PeriodicGraph::new(2);
        let v = g.add_node();
        g.add_edge(v, v, &[1, 0]).unwrap();
        assert_eq!(g.barycentric_placement().unwrap_err(), PeriodicGraphError::Disconnected);
        assert_eq!(g.is_locally_stable(), Err(PeriodicGraphError::Disconnected));
    }
}
