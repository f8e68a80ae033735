use crate::error::PeriodicGraphError;
use crate::periodic::PeriodicGraph;

/// Try to find the canonical representative of a graph
pub trait TryIntoCanon {
    type Error;

    fn try_into_canon(self) -> Result<Self, Self::Error>
    where
        Self: Sized;
}

impl TryIntoCanon for PeriodicGraph {
    type Error = PeriodicGraphError;

    /// Replaces the graph by the canonical representative of its
    /// isomorphism class
    ///
    /// The graph must be connected and locally stable.
    fn try_into_canon(self) -> Result<Self, Self::Error> {
        self.canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::super::cmp::IsIdentical;
    use super::*;
    use rand::prelude::*;
    use testing::{randomize_labels, NetIter, NetSpec};

    use rand_xoshiro::Xoshiro256Plus;

    use log::debug;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    #[test]
    fn cds() {
        log_init();

        let g1 = build(&testing::cds_primitive()).try_into_canon().unwrap();
        let mut net = testing::cds_primitive();
        net.edges.reverse();
        let g2 = build(&net).try_into_canon().unwrap();
        assert!(g1.is_identical(&g2));
    }

    #[test]
    fn random_canon() {
        log_init();

        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let nets = NetIter::default().filter(|net| {
            let g = build(net);
            g.is_connected().unwrap() && g.is_locally_stable().unwrap()
        });

        for net in nets.take(30) {
            debug!("Initial net: {net:?}");
            let relabelled = randomize_labels(net.clone(), &mut rng);
            debug!("Randomised net: {relabelled:?}");
            let g = build(&net).try_into_canon().unwrap();
            debug!("Canonical graph (from initial): {g}");
            let gg = build(&relabelled).try_into_canon().unwrap();
            debug!("Canonical graph (from randomised): {gg}");
            assert!(g.is_identical(&gg));
            assert!(g.clone().try_into_canon().unwrap().is_identical(&g));
        }
    }

    #[test]
    fn unstable() {
        log_init();

        let mut g = PeriodicGraph::new(1);
        let v = g.add_node();
        g.add_edge(v, v, &[1]).unwrap();
        g.add_edge_unchecked(v, v, &[1]).unwrap();
        assert_eq!(
            g.try_into_canon().unwrap_err(),
            PeriodicGraphError::NotLocallyStable
        );
    }

    #[test]
    fn empty() {
        log_init();

        let g = PeriodicGraph::new(3);
        assert!(g.is_identical(&g.clone().try_into_canon().unwrap()));
        assert_eq!(g.systre_key().unwrap(), "3");
    }
}
