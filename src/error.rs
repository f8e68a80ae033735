use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PeriodicGraphError {
    #[error("Graph is not connected")]
    Disconnected,
    #[error("Graph is not locally stable")]
    NotLocallyStable,
    #[error("No such morphism: {reason}")]
    NoSuchMorphism { reason: &'static str },
    #[error("Found translation of finite order")]
    FiniteOrderTranslation,
    #[error("Graph is not minimal")]
    NotMinimal,
    #[error("Internal error: {0}")]
    Internal(&'static str),
    #[error("Computation was cancelled")]
    Cancelled,
    #[error("Expected a vector of dimension {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Edge already exists")]
    DuplicateEdge,
    #[error("Loop with zero shift")]
    TrivialLoop,
    #[error("No such node")]
    NoSuchNode,
    #[error("No such edge")]
    NoSuchEdge,
    #[error("Node still has incident edges")]
    NodeNotIsolated,
    #[error("Cell vectors do not form a full-rank integral basis")]
    InvalidCell,
    #[error("Morphism is not invertible")]
    NotInvertible,
    #[error("Morphisms cannot be composed")]
    IncompatibleMorphisms,
    #[error("Angle needs three distinct nodes")]
    DegenerateAngle,
    #[error("No cycle found within {limit} visited nodes")]
    CycleLimitExceeded { limit: usize },
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },
}

pub(crate) type Result<T> = std::result::Result<T, PeriodicGraphError>;
