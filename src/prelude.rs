pub use crate::cancel::CancelToken;
pub use crate::canon::TryIntoCanon;
pub use crate::cmp::IsIdentical;
pub use crate::cover::{CellFinder, Cover, MinimalImage};
pub use crate::error::PeriodicGraphError;
pub use crate::geometry::{Operator, Point, Vector};
pub use crate::graph::CanonicalGraph;
pub use crate::invariant::{EdgeCommand, Invariant};
pub use crate::matrix::{Matrix, Rational};
pub use crate::morphism::{Element, Morphism};
pub use crate::multigraph::OrientedEdge;
pub use crate::periodic::{Component, CoverEdge, CoverNode, PeriodicGraph};
