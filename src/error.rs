//! Error types for the outline pipeline

use crate::fragment::FragmentId;

/// Error type for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Outline generation filtered every candidate item away.
    ///
    /// Surfaced explicitly so the caller can retry with relaxed filtering
    /// instead of receiving a silently empty outline.
    #[error("outline generation produced no items")]
    EmptyOutline,

    #[error("invalid outline: {reason}")]
    InvalidOutline { reason: String },

    #[error("outline depth {depth} exceeds maximum {max}")]
    OutlineTooDeep { depth: usize, max: usize },

    /// The external narrative-function source failed.
    #[error("narrative classifier error: {0}")]
    Classifier(String),

    /// An assignment map referenced a fragment missing from the input set.
    #[error("unknown fragment referenced: {id}")]
    UnknownFragment { id: FragmentId },

    #[error("pipeline aborted")]
    Aborted,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
