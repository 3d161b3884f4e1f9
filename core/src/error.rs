//! Errors

use thiserror::Error;

/// Fatal configuration errors. Numerical edge cases and degenerate samples never surface here; they are clamped
/// or produce zero contributions where they occur.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Output buffer does not hold one entry per pixel.
    #[error("bad output buffer size: expected {expected} pixels, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Bounce range is empty or starts at zero.
    #[error("invalid bounce range [{min_bounce}, {max_bounce}]")]
    InvalidDepthRange { min_bounce: usize, max_bounce: usize },

    /// Sample budget cannot give every depth at least one dispatch block.
    #[error("sample budget {requested} too small, need at least {required}")]
    SampleBudgetTooSmall { requested: usize, required: usize },

    /// Metropolis passes requested before the chains were seeded.
    #[error("Metropolis passes require a burn-in first")]
    BurnInNotRun,
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
