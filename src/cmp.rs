use itertools::Itertools;

use crate::periodic::PeriodicGraph;

/// Check if two objects are identical
pub trait IsIdentical {
    fn is_identical(&self, other: &Self) -> bool;
}

/// Same dimension, same node indices and the same edges up to
/// orientation and insertion order
impl IsIdentical for PeriodicGraph {
    fn is_identical(&self, other: &Self) -> bool {
        self.dimension() == other.dimension()
            && self.nodes().eq(other.nodes())
            && self
                .edges()
                .map(|e| self.normalized(e))
                .sorted()
                .eq(other.edges().map(|e| other.normalized(e)).sorted())
    }
}
