//! Error type shared by every stage of the fit pipeline.

use thiserror::Error;

/// Result type for fit operations.
pub type Result<T> = std::result::Result<T, FitError>;

/// Errors raised by the fit pipeline.
///
/// `EmptyInput` and `InsufficientTrendData` describe "no data" conditions
/// that [`FitEngine`](crate::engine::FitEngine) absorbs into absent output
/// entries. The remaining variants are caller contract violations and are
/// propagated unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// A percentile was requested over zero elements.
    #[error("empty input: cannot compute a percentile of zero elements")]
    EmptyInput,

    /// Fewer than two points are available for a line fit.
    #[error("insufficient trend data: need at least 2 points, got {points}")]
    InsufficientTrendData { points: usize },

    /// A parameter is outside its valid domain.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A value that must be finite is infinite (or NaN where missing values are not allowed).
    #[error("non-finite input at index {index}")]
    NonFiniteInput { index: usize },

    /// Paired sequences have different lengths.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

impl FitError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
