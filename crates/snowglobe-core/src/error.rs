//! Error types for Snowglobe

use thiserror::Error;

/// Result type alias using Snowglobe's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Snowglobe operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The handle does not refer to a live node (deleted, or from another scene)
    #[error("Node not found")]
    NodeNotFound,

    /// The tree is deeper than the evaluator's fixed stack allows
    #[error("Scene depth {depth} exceeds the evaluator limit of {limit}")]
    DepthLimitExceeded { depth: usize, limit: usize },

    /// An integer selector from the host does not name any variant
    #[error("Unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: u32 },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
