//! # realcalc-core
//!
//! Arbitrary-precision floats with rigorous error bounds.
//!
//! [`LongFloat`] is a multi-word float on top of the `realcalc-kernel`
//! mantissa arithmetic. [`Estimate`] pairs one with an [`ErrorEstimate`]
//! bounding its distance from the real number it stands for, and keeps that
//! bound valid through arithmetic and the elementary functions.
//!
//! All state lives in a [`Context`]: the working precision, the kernel's
//! scratch buffers and the cached constants. Operations that cannot decide
//! their result at the current precision fail with
//! [`RealError::Precision`]; the caller retries with a wider context.
//!
//! ```
//! use realcalc_core::{Context, Estimate};
//!
//! let mut ctx = Context::with_precision(4)?;
//! let two = Estimate::from_i32(&ctx, 2);
//! let root = two.sqrt(&mut ctx)?;
//! assert!((root.weak_as_f64() - std::f64::consts::SQRT_2).abs() < 1e-15);
//! assert!(root.error().as_f64() < 1e-25);
//! # Ok::<(), realcalc_core::RealError>(())
//! ```

pub mod context;
pub mod error;
pub mod error_estimate;
pub mod estimate;
pub mod interval;
pub mod longfloat;
pub mod options;

// Re-exports
pub use context::Context;
pub use error::RealError;
pub use error_estimate::{ErrorEstimate, RoundingMode};
pub use estimate::{Estimate, MINIMUM_EXPONENT};
pub use interval::Interval;
pub use longfloat::{Kind, LongFloat};
pub use options::Options;
