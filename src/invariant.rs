use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::rc::Rc;

use itertools::Itertools;
use log::{debug, trace};
use petgraph::graph::NodeIndex;

use crate::cancel::CancelToken;
use crate::error::{PeriodicGraphError, Result};
use crate::geometry::Vector;
use crate::matrix::Matrix;
use crate::morphism::Morphism;
use crate::periodic::PeriodicGraph;
use crate::placement::difference;

type HashMap<K, V> = ahash::AHashMap<K, V>;

/// One edge of a canonical edge script
///
/// Nodes are numbered from one in the order a breadth-first
/// traversal discovers them.
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeCommand {
    pub source: usize,
    pub target: usize,
    pub shift: Vec<i64>,
}

/// The isomorphism invariant of a connected, locally stable periodic
/// graph
///
/// Two such graphs are isomorphic exactly if their invariants are
/// equal. Invariants are ordered by dimension, node count and edge
/// count first, then by their edge scripts. The [Display]
/// implementation produces the Systre key.
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Invariant {
    dim: usize,
    node_count: usize,
    script: Vec<EdgeCommand>,
}

impl Invariant {
    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.script.len()
    }

    pub fn script(&self) -> &[EdgeCommand] {
        &self.script
    }

    /// The dimension followed by source, target and shift of each edge
    pub fn to_vec(&self) -> Vec<i64> {
        let mut res = vec![self.dim as i64];
        for cmd in &self.script {
            res.push(cmd.source as i64);
            res.push(cmd.target as i64);
            res.extend_from_slice(&cmd.shift);
        }
        res
    }

    /// The canonical representative described by this invariant
    pub fn to_graph(&self) -> Result<PeriodicGraph> {
        let edges = self
            .script
            .iter()
            .map(|cmd| {
                match (cmd.source.checked_sub(1), cmd.target.checked_sub(1)) {
                    (Some(s), Some(t)) => Ok((s, t, cmd.shift.as_slice())),
                    _ => Err(PeriodicGraphError::InvalidKey {
                        reason: "node numbers start at 1".to_owned(),
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        PeriodicGraph::from_edges(self.dim, self.node_count, edges)
    }
}

impl PartialOrd for Invariant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Invariant {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.dim, self.node_count, self.script.len(), &self.script).cmp(&(
            other.dim,
            other.node_count,
            other.script.len(),
            &other.script,
        ))
    }
}

impl Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_vec().iter().format(" "))
    }
}

// Script entry with shifts in the coordinates of the essential shifts
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    source: usize,
    target: usize,
    shift: Vector,
}

impl PeriodicGraph {
    /// The isomorphism invariant
    ///
    /// The graph must be connected and locally stable.
    pub fn invariant(&self) -> Result<Rc<Invariant>> {
        self.invariant_with(&CancelToken::new())
    }

    /// Like [Self::invariant], but gives up as soon as `cancel` is
    /// triggered
    pub fn invariant_with(&self, cancel: &CancelToken) -> Result<Rc<Invariant>> {
        self.require_locally_stable()?;
        self.cache
            .invariant
            .get_or_try_init(self.version(), || self.compute_invariant(cancel))
    }

    /// The invariant as a string of space-separated integers
    pub fn systre_key(&self) -> Result<String> {
        Ok(self.invariant()?.to_string())
    }

    /// The canonical representative of this graph
    pub fn canonical(&self) -> Result<PeriodicGraph> {
        self.invariant()?.to_graph()
    }

    /// Reads a graph from a key as produced by [Self::systre_key]
    ///
    /// Nodes are numbered from one in order of first appearance.
    pub fn from_key(key: &str) -> Result<PeriodicGraph> {
        let invalid = |reason: String| PeriodicGraphError::InvalidKey { reason };
        let nums = key
            .split_whitespace()
            .map(|s| s.parse::<i64>().map_err(|err| invalid(format!("{s}: {err}"))))
            .collect::<Result<Vec<_>>>()?;
        let Some((&dim, rest)) = nums.split_first() else {
            return Err(invalid("empty key".to_owned()));
        };
        let dim = usize::try_from(dim).map_err(|_| invalid(format!("negative dimension {dim}")))?;
        if rest.len() % (dim + 2) != 0 {
            return Err(invalid(format!(
                "{} numbers do not form edges of dimension {dim}",
                rest.len()
            )));
        }

        let mut g = PeriodicGraph::new(dim);
        let mut nodes = Vec::new();
        for chunk in rest.chunks(dim + 2) {
            let mut ends = [0; 2];
            for (end, &n) in ends.iter_mut().zip(chunk) {
                // nodes must be numbered in order of first appearance
                let n = usize::try_from(n)
                    .ok()
                    .filter(|&n| n > 0 && n <= nodes.len() + 1)
                    .ok_or_else(|| invalid(format!("invalid node number {n}")))?;
                if n > nodes.len() {
                    nodes.push(g.add_node());
                }
                *end = n - 1;
            }
            g.add_edge(nodes[ends[0]], nodes[ends[1]], &chunk[2..])?;
        }
        Ok(g)
    }

    fn compute_invariant(&self, cancel: &CancelToken) -> Result<Invariant> {
        let d = self.dimension();
        let m = self.edge_count();
        if self.node_count() == 0 {
            return Ok(Invariant {
                dim: d,
                node_count: 0,
                script: Vec::new(),
            });
        }
        let placement = self.barycentric_placement()?;
        let bases = self.characteristic_bases()?;
        let internal = PeriodicGraphError::Internal;

        let mut best: Option<Vec<Entry>> = None;
        let mut best_frame: Option<(NodeIndex, Matrix)> = None;

        'bases: for basis in bases.iter() {
            cancel.check()?;
            let frame = self.difference_matrix(basis.edges())?;
            let to_frame = frame
                .inverse()
                .ok_or(internal("singular characteristic basis"))?;
            let v0 = basis.start();

            let mut numbers = HashMap::default();
            let mut new_pos = HashMap::default();
            numbers.insert(v0, 1);
            new_pos.insert(v0, Vector::zero(d));
            let mut queue = VecDeque::from([(v0, Vector::zero(d))]);
            let mut next = 2;
            let mut script = Vec::with_capacity(m);
            let mut equal = best.is_some();
            let mut essential = Matrix::zero(d, d);
            let mut rank = 0;
            let mut adjustment = if d == 0 { Some(Matrix::identity(0)) } else { None };

            while let Some((v, p)) = queue.pop_front() {
                let vn = numbers[&v];
                let mut incident = self
                    .all_incidences(v)
                    .into_iter()
                    .map(|e| {
                        difference(self, &placement, e)
                            .map(|diff| (diff.times(&to_frame), e))
                            .ok_or(PeriodicGraphError::NoSuchEdge)
                    })
                    .collect::<Result<Vec<_>>>()?;
                incident.sort_by(|a, b| a.0.cmp(&b.0));

                for (row, e) in incident {
                    let w = self.target(e);
                    let s = &p + &row;
                    let (wn, shift) = if let Some(&wn) = numbers.get(&w) {
                        if wn < vn {
                            continue;
                        }
                        let raw = &s - &new_pos[&w];
                        let shift = if let Some(adjustment) = &adjustment {
                            raw.times(adjustment)
                        } else {
                            essential.set_row(rank, raw.coords());
                            if essential.rank() > rank {
                                let unit = Vector::unit(d, rank);
                                rank += 1;
                                if rank == d {
                                    adjustment = Some(
                                        essential
                                            .inverse()
                                            .ok_or(internal("singular essential shifts"))?,
                                    );
                                }
                                unit
                            } else {
                                essential.set_row(rank, Vector::zero(d).coords());
                                let coords = essential
                                    .solution_in_rows(raw.coords())
                                    .ok_or(internal("shift outside essential span"))?;
                                Vector::new(coords)
                            }
                        };
                        (wn, shift)
                    } else {
                        let wn = next;
                        next += 1;
                        numbers.insert(w, wn);
                        new_pos.insert(w, s.clone());
                        queue.push_back((w, s));
                        (wn, Vector::zero(d))
                    };

                    if vn < wn || (vn == wn && shift.sign() == Ordering::Greater) {
                        let entry = Entry { source: vn, target: wn, shift };
                        if equal {
                            let current = best.as_ref().and_then(|b| b.get(script.len()));
                            match current.map(|b| entry.cmp(b)) {
                                Some(Ordering::Less) => equal = false,
                                Some(Ordering::Greater) => {
                                    trace!("Abandoning basis after {} edges", script.len());
                                    continue 'bases;
                                }
                                _ => {}
                            }
                        }
                        script.push(entry);
                    }
                }
            }

            if script.len() != m || adjustment.is_none() {
                return Err(internal("incomplete edge script"));
            }
            if best.is_none() || !equal {
                trace!("New best script from basis at node {}", v0.index());
                best = Some(script);
                best_frame = Some((v0, &essential * &frame));
            }
        }

        let (Some(best), Some((start, frame))) = (best, best_frame) else {
            return Err(internal("no characteristic basis"));
        };
        if best.len() < d {
            return Err(internal("too few edges for a full lattice"));
        }
        let mut lattice = Matrix::from_rows(d, best.iter().map(|e| e.shift.coords().to_vec()));
        lattice.triangulate(None, true, false);
        let to_lattice = lattice
            .sub_matrix(0, 0, d, d)
            .inverse()
            .ok_or(internal("shifts do not span the lattice"))?;

        let mut script = best
            .iter()
            .map(|e| {
                let mut shift = e
                    .shift
                    .times(&to_lattice)
                    .to_ints()
                    .ok_or(internal("non-integral canonical shift"))?;
                if e.source == e.target && shift.iter().find(|&&x| x != 0) < Some(&0) {
                    shift.iter_mut().for_each(|x| *x = -*x);
                }
                Ok(EdgeCommand {
                    source: e.source,
                    target: e.target,
                    shift,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        script.sort();
        let invariant = Invariant {
            dim: d,
            node_count: self.node_count(),
            script,
        };
        debug!("Invariant: {invariant}");

        let canonical = invariant.to_graph()?;
        let to_canonical = &frame
            .inverse()
            .ok_or(internal("singular winning frame"))?
            * &to_lattice;
        let first = canonical
            .nodes()
            .next()
            .ok_or(internal("empty canonical graph"))?;
        match Morphism::new(self, start, &canonical, first, &to_canonical) {
            Ok(_) => Ok(invariant),
            Err(PeriodicGraphError::NoSuchMorphism { .. }) => {
                Err(internal("canonical form is not isomorphic to the graph"))
            }
            Err(err) => Err(err),
        }
    }
}
