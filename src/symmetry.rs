use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use num_bigint::BigInt;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;

use crate::cancel::CancelToken;
use crate::error::{PeriodicGraphError, Result};
use crate::geometry::Operator;
use crate::matrix::{Matrix, Rational};
use crate::morphism::Morphism;
use crate::periodic::PeriodicGraph;

type HashMap<K, V> = ahash::AHashMap<K, V>;

impl PeriodicGraph {
    /// The combinatorial symmetry group
    ///
    /// The identity comes first. The graph must be connected and
    /// locally stable. The group of the empty graph only contains the
    /// identity.
    pub fn symmetries(&self) -> Result<Rc<Vec<Morphism>>> {
        self.symmetries_with(&CancelToken::new())
    }

    /// Like [Self::symmetries], but gives up as soon as `cancel` is
    /// triggered
    pub fn symmetries_with(&self, cancel: &CancelToken) -> Result<Rc<Vec<Morphism>>> {
        self.require_locally_stable()?;
        self.cache
            .symmetries
            .get_or_try_init(self.version(), || self.compute_symmetries(cancel))
    }

    fn compute_symmetries(&self, cancel: &CancelToken) -> Result<Vec<Morphism>> {
        if self.node_count() == 0 {
            return Ok(vec![Morphism::identity(self)?]);
        }
        let bases = self.characteristic_bases()?;
        let Some(reference) = bases.first() else {
            return Err(PeriodicGraphError::Internal("no characteristic basis"));
        };
        let v0 = reference.start();
        let frame = self.difference_matrix(reference.edges())?;

        let mut generators = IndexSet::new();
        for basis in bases.iter() {
            cancel.check()?;
            let image = self.difference_matrix(basis.edges())?;
            let Some(op) = Matrix::solve(&frame, &image) else {
                continue;
            };
            if !op.is_unimodular() {
                continue;
            }
            match Morphism::new(self, v0, self, basis.start(), &op) {
                Ok(phi) => {
                    generators.insert(phi);
                }
                Err(PeriodicGraphError::NoSuchMorphism { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        debug!("Found {} generating symmetries", generators.len());

        let identity = Morphism::new(self, v0, self, v0, &Matrix::identity(self.dimension()))?;
        let mut group = IndexSet::from([identity]);
        let mut next = 0;
        while let Some(phi) = group.get_index(next).cloned() {
            cancel.check()?;
            for psi in &generators {
                group.insert(phi.compose(psi)?);
            }
            next += 1;
        }
        debug!("Symmetry group has order {}", group.len());
        Ok(group.into_iter().collect())
    }

    /// The affine operators of all symmetries in the barycentric
    /// placement, with translations reduced modulo the lattice
    pub fn symmetry_operators(&self) -> Result<Vec<Operator>> {
        self.symmetries()?
            .iter()
            .map(|phi| phi.affine_operator(self, self))
            .collect()
    }

    /// Symmetries fixing `v`
    pub fn node_stabilizer(&self, v: NodeIndex) -> Result<Vec<Morphism>> {
        Ok(Vec::from_iter(
            self.symmetries()?
                .iter()
                .filter(|phi| phi.node_image(v) == Some(v))
                .cloned(),
        ))
    }

    /// Orbits of the symmetry group on the nodes
    pub fn node_orbits(&self) -> Result<Vec<Vec<NodeIndex>>> {
        let symmetries = self.symmetries()?;
        let mut seen = IndexSet::new();
        let mut res = Vec::new();
        for v in self.nodes() {
            if seen.contains(&v) {
                continue;
            }
            let mut orbit = Vec::from_iter(
                symmetries
                    .iter()
                    .filter_map(|phi| phi.node_image(v))
                    .collect::<IndexSet<_>>(),
            );
            orbit.sort_unstable();
            seen.extend(orbit.iter().copied());
            res.push(orbit);
        }
        Ok(res)
    }

    /// Orbits of the symmetry group on the undirected edges
    pub fn edge_orbits(&self) -> Result<Vec<Vec<EdgeIndex>>> {
        let symmetries = self.symmetries()?;
        let edges = Vec::from_iter(self.edges());
        let index: HashMap<_, _> = edges.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
        let mut partition = UnionFind::new(edges.len());
        for phi in symmetries.iter() {
            for (i, &e) in edges.iter().enumerate() {
                if let Some(f) = phi.edge_image(e) {
                    partition.union(i, index[&f.id]);
                }
            }
        }
        let mut classes: IndexMap<usize, Vec<EdgeIndex>> = IndexMap::new();
        for (i, e) in edges.iter().enumerate() {
            classes.entry(partition.find(i)).or_default().push(e.id);
        }
        Ok(classes.into_values().collect())
    }

    /// A positive definite quadratic form, given as a Gram matrix,
    /// that is invariant under all symmetries
    pub fn invariant_form(&self) -> Result<Matrix> {
        let symmetries = self.symmetries()?;
        let d = self.dimension();
        let sum = symmetries.iter().fold(Matrix::zero(d, d), |acc, phi| {
            let a = phi.operator();
            &acc + &(a * &a.transpose())
        });
        let order = Rational::from_integer(BigInt::from(symmetries.len()));
        Ok(sum.scaled(&order.recip()))
    }
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

    #[test]
    fn group_orders() {
        log_init();
        for (net, order) in [
            (testing::pcu(), 48),
            (testing::dia(), 48),
            (testing::cds_primitive(), 16),
            (testing::double_hcb(), 12),
            (testing::hcb(), 12),
            (testing::srs(), 24),
            (testing::line(), 2),
        ] {
            let g = build(&net);
            assert_eq!(g.symmetries().unwrap().len(), order);
        }
    }

    #[test]
    fn closure() {
        log_init();
        let g = build(&testing::cds_primitive());
        let syms = g.symmetries().unwrap();
        let id = Morphism::identity(&g).unwrap();
        assert_eq!(syms[0], id);
        let set: IndexSet<_> = syms.iter().cloned().collect();
        for phi in syms.iter() {
            assert!(set.contains(&phi.inverse().unwrap()));
            for psi in syms.iter() {
                assert!(set.contains(&phi.compose(psi).unwrap()));
            }
        }
    }

    #[test]
    fn orbits() {
        log_init();
        let g = build(&testing::cds_primitive());
        for v in g.nodes() {
            assert_eq!(g.node_stabilizer(v).unwrap().len(), 8);
        }
        let orbits = g.node_orbits().unwrap();
        assert_eq!(orbits.len(), 1);
        assert_eq!(orbits[0].len(), 2);
        let edge_orbits = g.edge_orbits().unwrap();
        assert_eq!(edge_orbits.len(), 2);
        assert!(edge_orbits.iter().all(|o| o.len() == 2));

        let srs = build(&testing::srs());
        assert_eq!(srs.node_orbits().unwrap().len(), 1);
        assert_eq!(srs.edge_orbits().unwrap().len(), 1);
    }

    #[test]
    fn operators() {
        log_init();
        let g = build(&testing::dia());
        let ops = g.symmetry_operators().unwrap();
        assert_eq!(ops.len(), 48);
        assert!(ops.iter().all(|op| op.linear_part().is_unimodular()));
        assert!(ops.iter().any(|op| op.to_string() == "-x+1/4,-y+1/4,-z+1/4"));

        let form = g.invariant_form().unwrap();
        for op in &ops {
            let a = op.linear_part();
            assert_eq!(&(a * &form) * &a.transpose(), form);
        }
        let pcu = build(&testing::pcu());
        assert_eq!(pcu.invariant_form().unwrap(), Matrix::identity(3));
    }

    #[test]
    fn preconditions() {
        log_init();
        let mut g = PeriodicGraph::new(1);
        let v = g.add_node();
        g.add_edge(v, v, &[1]).unwrap();
        g.add_edge_unchecked(v, v, &[1]).unwrap();
        assert_eq!(g.symmetries(), Err(PeriodicGraphError::NotLocallyStable));

        let mut g = PeriodicGraph::new(2);
        let v = g.add_node();
        g.add_edge(v, v, &[1, 0]).unwrap();
        assert_eq!(g.symmetries(), Err(PeriodicGraphError::Disconnected));
    }

    #[test]
    fn empty_graph() {
        log_init();
        let g = PeriodicGraph::new(3);
        let syms = g.symmetries().unwrap();
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].size(), 0);
        assert!(syms[0].is_isomorphism());
        let ops = g.symmetry_operators().unwrap();
        assert_eq!(ops, [Operator::identity(3)]);
        assert!(g.node_orbits().unwrap().is_empty());
        assert!(g.edge_orbits().unwrap().is_empty());
        assert_eq!(g.invariant_form().unwrap(), Matrix::identity(3));
    }

    #[test]
    fn cancellation() {
        log_init();
        let g = build(&testing::dia());
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(g.symmetries_with(&token), Err(PeriodicGraphError::Cancelled));
        assert_eq!(g.symmetries().unwrap().len(), 48);
    }
}
