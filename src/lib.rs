//! Canonical forms and symmetries of periodic graphs.
//!
//! A periodic graph is an infinite graph that is invariant under a
//! lattice of translations, like the underlying net of a crystal. It
//! is represented by a finite quotient multigraph with integer shift
//! vectors on the edges. This crate computes barycentric placements,
//! combinatorial symmetry groups and the
//! [Systre](http://gavrog.org/Systre-Help.html) invariant, which is
//! equal for two representations exactly if they describe isomorphic
//! infinite graphs. All arithmetic is exact.
//!
//! # Example
//!
//! ```rust
//! use pgraph_canon::prelude::*;
//!
//! // The diamond net in a primitive cell
//! let mut g1 = PeriodicGraph::new(3);
//! let v = g1.add_node();
//! let w = g1.add_node();
//! for shift in [[0, 0, 0], [-1, 0, 0], [0, -1, 0], [0, 0, -1]] {
//!     g1.add_edge(v, w, &shift).unwrap();
//! }
//!
//! // The same net with a different choice of representative for `w`
//! let mut g2 = g1.clone();
//! g2.shift_node(w, &[1, 0, 0]).unwrap();
//! assert!(!g1.is_identical(&g2));
//!
//! // The full symmetry group has order 48
//! assert_eq!(g1.symmetries().unwrap().len(), 48);
//!
//! // The invariants are equal
//! assert_eq!(g1.invariant().unwrap(), g2.invariant().unwrap());
//! assert_eq!(
//!     g1.systre_key().unwrap(),
//!     "3 1 2 0 0 0 1 2 0 0 1 1 2 0 1 0 1 2 1 0 0"
//! );
//!
//! // Alternatively, we can use a dedicated `struct` for canonically
//! // labelled graphs
//! let c1 = CanonicalGraph::try_from(g1).unwrap();
//! let c2 = CanonicalGraph::try_from(g2).unwrap();
//! assert_eq!(c1, c2);
//! ```
//!
//! # Features
//!
//! * `serde-1`: Enables serialisation of
//!              [Invariant](invariant::Invariant) and
//!              [CanonicalGraph](graph::CanonicalGraph) objects using
//!              [serde](https://crates.io/crates/serde).
//!
//! To enable features `feature1`, `feature2` add the following to
//! your Cargo.toml:
//! ```toml
//! [dependencies]
//! pgraph-canon = { version = "0.1", features = ["feature1", "feature2"] }
//! ```
pub mod bases;
mod cache;
pub mod cancel;
pub mod canon;
mod cmp;
pub mod cover;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod invariant;
pub mod matrix;
pub mod morphism;
mod multigraph;
pub mod periodic;
pub mod placement;
pub mod prelude;
pub mod symmetry;

pub use canon::TryIntoCanon;
pub use cmp::IsIdentical;
pub use error::PeriodicGraphError;
pub use multigraph::OrientedEdge;
pub use periodic::PeriodicGraph;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use testing::NetSpec;

    fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    // A 3-dimensional net given in two different cells must have the
    // same minimal image
    #[test]
    fn cds_cells() {
        let cds = build(&testing::cds());
        let primitive = build(&testing::cds_primitive());

        assert!(cds.is_connected().unwrap());
        assert!(cds.is_locally_stable().unwrap());
        assert_eq!(cds.translational_equivalences().unwrap().len(), 2);
        assert_ne!(cds.systre_key().unwrap(), primitive.systre_key().unwrap());

        let image = cds.minimal_image().unwrap();
        let c1 = CanonicalGraph::try_from(image.graph()).unwrap();
        let c2 = CanonicalGraph::try_from(&primitive).unwrap();
        assert_eq!(c1, c2);
        assert!(c1.get().is_identical(c2.get()));
    }

    #[test]
    fn pcu_loop_order() {
        let pcu = build(&testing::pcu());
        assert!(pcu.is_connected().unwrap());
        assert!(pcu.is_locally_stable().unwrap());
        assert_eq!(pcu.symmetries().unwrap().len(), 48);

        for perm in [[0, 1, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let mut net = testing::pcu();
            net.edges = Vec::from_iter(perm.iter().map(|&i| testing::pcu().edges[i].clone()));
            assert_eq!(build(&net).systre_key().unwrap(), pcu.systre_key().unwrap());
        }
    }
}
