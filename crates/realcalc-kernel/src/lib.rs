//! # realcalc-kernel
//!
//! Fixed-width mantissa arithmetic on little-endian `u32` words, with an
//! FFT convolution multiplier for long operands.
//!
//! Every mantissa handled here has the same length, the *working precision*
//! of the [`Kernel`] that owns the scratch buffers. Free functions in
//! [`mantissa`] need no scratch space; multiplication and division go through
//! a [`Kernel`] value.

pub mod arith;
pub mod constants;
pub mod convolution;
pub mod host;
pub mod kernel;
pub mod mantissa;
pub mod table_cache;

use thiserror::Error;

// Re-exports
pub use constants::{
    DEFAULT_CONVOLUTION_THRESHOLD, DEFAULT_EVALUATION_DEPTH, MIN_WORKING_PRECISION,
};
pub use convolution::Convolution;
pub use kernel::Kernel;

/// Errors raised while sizing the kernel or its convolution engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The requested working precision is below the supported minimum.
    #[error("working precision {0} is below the minimum of 3 words")]
    InvalidPrecision(usize),

    /// A transform size that is not a power of two.
    #[error("convolution size {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// A transform too short to hold the shared DC/Nyquist slot and one bin pair.
    #[error("convolution size {0} is below the minimum of 4")]
    TransformTooSmall(usize),

    /// A transform larger than the engine was built for.
    #[error("convolution size {size} exceeds engine capacity {capacity}")]
    TransformTooLarge { size: usize, capacity: usize },
}
