use std::rc::Rc;

use itertools::Itertools;
use log::debug;
use petgraph::graph::NodeIndex;

use crate::error::{PeriodicGraphError, Result};
use crate::matrix::Matrix;
use crate::multigraph::OrientedEdge;
use crate::periodic::PeriodicGraph;
use crate::placement::{difference, Placement};

/// A frame of `d` oriented edges with linearly independent
/// difference vectors
///
/// The frame is anchored at `start`, the source of its first edge.
/// In dimension zero the frame is empty and only the anchor remains.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharacteristicBasis {
    start: NodeIndex,
    edges: Vec<OrientedEdge>,
}

impl CharacteristicBasis {
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    pub fn edges(&self) -> &[OrientedEdge] {
        &self.edges
    }
}

struct Frames<'a> {
    graph: &'a PeriodicGraph,
    placement: &'a Placement,
}

impl Frames<'_> {
    fn rank(&self, edges: &[OrientedEdge]) -> Result<usize> {
        let rows = edges
            .iter()
            .map(|&e| {
                difference(self.graph, self.placement, e)
                    .map(|v| v.coords().to_vec())
                    .ok_or(PeriodicGraphError::NoSuchEdge)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix::from_rows(self.graph.dimension(), rows).rank())
    }

    fn basis(&self, edges: Vec<OrientedEdge>) -> CharacteristicBasis {
        CharacteristicBasis {
            start: self.graph.source(edges[0]),
            edges,
        }
    }

    /// All orderings of all independent `d`-subsets of `edges`
    fn good_combinations(&self, edges: &[OrientedEdge]) -> Result<Vec<CharacteristicBasis>> {
        let d = self.graph.dimension();
        let mut res = Vec::new();
        for combination in edges.iter().copied().combinations(d) {
            if self.rank(&combination)? == d {
                res.extend(
                    combination
                        .into_iter()
                        .permutations(d)
                        .map(|edges| self.basis(edges)),
                );
            }
        }
        Ok(res)
    }

    /// Chains of `d` edges where each edge starts at the target of the
    /// previous one
    fn chains(&self, start: NodeIndex) -> Result<Vec<CharacteristicBasis>> {
        let d = self.graph.dimension();
        let mut res = Vec::new();
        let mut stack = vec![Vec::new()];
        while let Some(chain) = stack.pop() {
            if chain.len() == d {
                res.push(self.basis(chain));
                continue;
            }
            let v = match chain.last() {
                Some(&e) => self.graph.target(e),
                None => start,
            };
            for e in self.graph.all_incidences(v).into_iter().rev() {
                let mut next = chain.clone();
                next.push(e);
                if self.rank(&next)? == next.len() {
                    stack.push(next);
                }
            }
        }
        Ok(res)
    }
}

impl PeriodicGraph {
    /// All characteristic bases of the graph
    ///
    /// These are the independent frames of edges sharing a common
    /// source if there are any. Otherwise they are the independent
    /// chains of edges, and as a last resort all independent frames
    /// of arbitrary edges.
    pub fn characteristic_bases(&self) -> Result<Rc<Vec<CharacteristicBasis>>> {
        let placement = self.barycentric_placement()?;
        self.cache.bases.get_or_try_init(self.version(), || {
            let bases = self.compute_bases(&placement)?;
            debug!("Found {} characteristic bases", bases.len());
            Ok(bases)
        })
    }

    fn compute_bases(&self, placement: &Placement) -> Result<Vec<CharacteristicBasis>> {
        if self.dimension() == 0 {
            return Ok(Vec::from_iter(self.nodes().map(|start| CharacteristicBasis {
                start,
                edges: Vec::new(),
            })));
        }
        let frames = Frames { graph: self, placement };
        let mut res = Vec::new();
        for v in self.nodes() {
            res.extend(frames.good_combinations(&self.all_incidences(v))?);
        }
        if res.is_empty() {
            for v in self.nodes() {
                res.extend(frames.chains(v)?);
            }
        }
        if res.is_empty() {
            res = frames.good_combinations(&self.directed_edges())?;
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

    fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    #[test]
    fn counts() {
        log_init();
        for (net, count) in [
            (testing::dia(), 48),
            (testing::pcu(), 48),
            (testing::cds_primitive(), 16),
            (testing::double_hcb(), 24),
            (testing::hcb(), 12),
        ] {
            let g = build(&net);
            let bases = g.characteristic_bases().unwrap();
            assert_eq!(bases.len(), count);
            for b in bases.iter() {
                assert_eq!(b.edges().len(), g.dimension());
                assert_eq!(g.source(b.edges()[0]), b.start());
                let m = g.difference_matrix(b.edges()).unwrap();
                assert_eq!(m.rank(), g.dimension());
            }
        }
    }

    #[test]
    fn chains() {
        log_init();
        let g = build(&testing::cds_primitive());
        let bases = g.characteristic_bases().unwrap();
        for b in bases.iter() {
            for (e, f) in b.edges().iter().tuple_windows() {
                assert_eq!(g.target(*e), g.source(*f));
            }
        }
    }

    #[test]
    fn dimension_zero() {
        let mut g = PeriodicGraph::new(0);
        let v = g.add_node();
        let bases = g.characteristic_bases().unwrap();
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].start(), v);
        assert!(bases[0].edges().is_empty());
    }
}
