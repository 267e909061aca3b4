//! Error type shared by every layer above the kernel.

use realcalc_kernel::KernelError;

/// Errors raised by long-float and estimate operations.
///
/// [`RealError::Precision`] is the expected, non-fatal outcome when the
/// working precision cannot decide a question; callers retry at a higher
/// precision. Nothing in this crate retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealError {
    /// The argument lies (provably, or ambiguously at a closed boundary)
    /// outside the domain of the function.
    #[error("domain error: {0}")]
    Domain(String),

    /// The current precision is not enough to decide the result.
    #[error("insufficient precision: {0}")]
    Precision(String),

    /// A value that violates a representational constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The kernel could not be sized as requested.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RealError {
    /// Is this the retry-at-higher-precision signal?
    #[must_use]
    pub fn is_precision(&self) -> bool {
        matches!(self, Self::Precision(_))
    }
}
