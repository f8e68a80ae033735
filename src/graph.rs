use std::cmp::{Eq, Ord, Ordering, PartialEq, PartialOrd};
use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{PeriodicGraphError, Result};
use crate::invariant::Invariant;
use crate::periodic::PeriodicGraph;

/// Canonically labelled periodic graph
///
/// Wraps the canonical representative of an isomorphism class
/// together with its invariant. Two canonical graphs compare equal
/// exactly if the graphs they were built from are isomorphic. The
/// graph itself is only accessible by shared reference, so the
/// labelling cannot be destroyed by mutation.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use pgraph_canon::prelude::*;
///
/// let mut g = PeriodicGraph::new(1);
/// let v = g.add_node();
/// g.add_edge(v, v, &[-1]).unwrap();
///
/// let g = CanonicalGraph::try_from(g).unwrap();
/// assert_eq!(g.to_string(), "1 1 1 1");
///
/// // canonical graphs can be used in hash sets and tables
/// let h: CanonicalGraph = "1 1 1 1".parse().unwrap();
/// let mut graphs = HashSet::new();
/// graphs.insert(g);
/// assert!(graphs.contains(&h));
/// ```
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-1",
    serde(try_from = "Invariant", into = "Invariant")
)]
#[derive(Clone, Debug)]
pub struct CanonicalGraph {
    graph: PeriodicGraph,
    invariant: Invariant,
}

impl CanonicalGraph {
    /// Gets a reference to the canonical representative
    pub fn get(&self) -> &PeriodicGraph {
        &self.graph
    }

    pub fn invariant(&self) -> &Invariant {
        &self.invariant
    }

    pub fn systre_key(&self) -> String {
        self.invariant.to_string()
    }

    pub fn dimension(&self) -> usize {
        self.invariant.dimension()
    }

    pub fn node_count(&self) -> usize {
        self.invariant.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.invariant.edge_count()
    }
}

impl AsRef<PeriodicGraph> for CanonicalGraph {
    fn as_ref(&self) -> &PeriodicGraph {
        &self.graph
    }
}

impl TryFrom<&PeriodicGraph> for CanonicalGraph {
    type Error = PeriodicGraphError;

    fn try_from(g: &PeriodicGraph) -> Result<Self> {
        let invariant = Invariant::clone(&*g.invariant()?);
        let graph = invariant.to_graph()?;
        Ok(Self { graph, invariant })
    }
}

impl TryFrom<PeriodicGraph> for CanonicalGraph {
    type Error = PeriodicGraphError;

    fn try_from(g: PeriodicGraph) -> Result<Self> {
        Self::try_from(&g)
    }
}

/// Accepts only invariants that are canonical for the graph they
/// describe
impl TryFrom<Invariant> for CanonicalGraph {
    type Error = PeriodicGraphError;

    fn try_from(invariant: Invariant) -> Result<Self> {
        let graph = invariant.to_graph()?;
        if *graph.invariant()? != invariant {
            return Err(PeriodicGraphError::InvalidKey {
                reason: "not in canonical form".to_owned(),
            });
        }
        Ok(Self { graph, invariant })
    }
}

impl From<CanonicalGraph> for PeriodicGraph {
    fn from(g: CanonicalGraph) -> Self {
        g.graph
    }
}

impl From<CanonicalGraph> for Invariant {
    fn from(g: CanonicalGraph) -> Self {
        g.invariant
    }
}

impl FromStr for CanonicalGraph {
    type Err = PeriodicGraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(PeriodicGraph::from_key(s)?)
    }
}

impl Display for CanonicalGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.invariant, f)
    }
}

impl PartialEq for CanonicalGraph {
    fn eq(&self, other: &Self) -> bool {
        self.invariant == other.invariant
    }
}

impl Eq for CanonicalGraph {}

impl Hash for CanonicalGraph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.invariant.hash(state)
    }
}

impl Ord for CanonicalGraph {
    fn cmp(&self, other: &Self) -> Ordering {
        self.invariant.cmp(&other.invariant)
    }
}

impl PartialOrd for CanonicalGraph {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
