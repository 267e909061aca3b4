//! Value plus error bound.
//!
//! An [`Estimate`] pairs a [`LongFloat`] with an [`ErrorEstimate`] such that
//! the real number it approximates lies within `error` of `value`. Every
//! operation widens the bound by its own rounding error, so the invariant
//! survives arbitrary chains of operations.
//!
//! A value of exactly zero is never kept: `(0, e)` becomes `(e, 2e)` and
//! `(0, 0)` becomes the smallest representable magnitude with twice that as
//! error. Relative precision is then always meaningful.

mod arith;
mod compare;
mod functions;
mod series;
mod truncate;

use std::fmt;

use crate::error_estimate::{ErrorEstimate, RoundingMode};
use crate::longfloat::LongFloat;
use crate::{Context, RealError};

/// Bit exponent of the smallest magnitude an Estimate stands in for zero with.
pub const MINIMUM_EXPONENT: i32 = -0x7FFF_FFFE;

/// A LongFloat value with an absolute error bound.
#[derive(Debug, Clone)]
pub struct Estimate {
    value: LongFloat,
    error: ErrorEstimate,
}

impl Estimate {
    /// Pair `value` with `error`, replacing an exact zero value.
    #[must_use]
    pub fn new(value: LongFloat, error: ErrorEstimate) -> Self {
        let mut est = Self { value, error };
        est.correct_zero();
        est
    }

    /// An estimate with zero error.
    #[must_use]
    pub fn exact(value: LongFloat) -> Self {
        Self::new(value, ErrorEstimate::ZERO)
    }

    /// Exact estimate of a double at the context's precision.
    #[must_use]
    pub fn from_f64(ctx: &Context, x: f64) -> Self {
        Self::exact(LongFloat::from_f64(x, ctx.precision()))
    }

    #[must_use]
    pub fn from_i32(ctx: &Context, x: i32) -> Self {
        Self::exact(LongFloat::from_i32(x, 0, ctx.precision()))
    }

    /// Parse a decimal string. The error covers the rounding of the
    /// conversion.
    pub fn from_str(ctx: &mut Context, s: &str) -> Result<Self, RealError> {
        let lf = LongFloat::from_str(s, ctx.kernel_mut())?;
        let err = ErrorEstimate::rounding_error(&lf, lf.rounding_error_div());
        Ok(Self::new(lf, err))
    }

    fn correct_zero(&mut self) {
        if !self.value.is_zero() {
            return;
        }
        let words = self.value.word_count();
        if self.error.is_zero() {
            let tiny = ErrorEstimate::new(0x8000_0000, MINIMUM_EXPONENT);
            self.value = tiny.as_longfloat(words);
            self.error = ErrorEstimate::new(0x8000_0000, MINIMUM_EXPONENT + 1);
        } else {
            self.value = self.error.as_longfloat(words);
            self.error = self.error.shl(1);
        }
    }

    #[must_use]
    pub fn value(&self) -> &LongFloat {
        &self.value
    }

    #[must_use]
    pub fn error(&self) -> ErrorEstimate {
        self.error
    }

    /// Significant words of the value; sizes series and iterations.
    #[must_use]
    pub fn precision(&self) -> usize {
        self.value.precision()
    }

    pub fn set_precision(&mut self, words: usize) {
        self.value.set_precision(words);
    }

    /// The error bound as an exact estimate.
    #[must_use]
    pub fn get_error(&self) -> Self {
        Self::exact(self.error.as_longfloat(self.value.word_count()))
    }

    /// Replace the error with an upper bound on `|val|` plus its own error.
    pub fn set_error(&mut self, val: &Self) -> &mut Self {
        self.error = ErrorEstimate::from_longfloat(&val.value, RoundingMode::Up).add(val.error);
        self
    }

    pub fn set_error_zero(&mut self) -> &mut Self {
        self.error = ErrorEstimate::ZERO;
        self
    }

    /// Widen the error by `|val|` plus its own error.
    pub fn add_error(&mut self, val: &Self) -> &mut Self {
        self.error = self
            .error
            .add(ErrorEstimate::from_longfloat(&val.value, RoundingMode::Up))
            .add(val.error);
        self
    }

    /// Widen the error by a bound already in error form.
    pub(crate) fn widen(&mut self, err: ErrorEstimate) -> &mut Self {
        self.error = self.error.add(err);
        self
    }

    /// Upper bound on `|real|`.
    pub(crate) fn magnitude_above(&self) -> ErrorEstimate {
        ErrorEstimate::from_longfloat(&self.value, RoundingMode::Up).add(self.error)
    }

    /// Lower bound on `|real|`; zero when the interval reaches zero.
    pub(crate) fn magnitude_below(&self) -> ErrorEstimate {
        ErrorEstimate::from_longfloat(&self.value, RoundingMode::Down)
            .checked_sub(self.error)
            .unwrap_or(ErrorEstimate::ZERO)
    }

    /// Lower bound on the number of correct leading bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn relative_error(&self) -> i32 {
        let bits = i64::from(self.value.normalize()) - i64::from(self.error.exponent()) - 1;
        bits.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {:e}", self.value, self.error.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::with_precision(4).unwrap()
    }

    #[test]
    fn zero_with_error_becomes_error_pair() {
        let c = ctx();
        let est = Estimate::new(LongFloat::zero(c.precision()), ErrorEstimate::from_f64(0.25));
        assert_eq!(est.value().as_f64(), 0.25);
        assert_eq!(est.error().as_f64(), 0.5);
    }

    #[test]
    fn exact_zero_becomes_tiny() {
        let c = ctx();
        let est = Estimate::from_f64(&c, 0.0);
        assert!(est.value().is_normal());
        assert!(!est.value().is_negative());
        assert_eq!(est.error(), ErrorEstimate::new(0x8000_0000, MINIMUM_EXPONENT + 1));
        let v = ErrorEstimate::from_longfloat(est.value(), RoundingMode::Up);
        assert_eq!(v.shl(1), est.error());
    }

    #[test]
    fn from_str_carries_conversion_error() {
        let mut c = ctx();
        let est = Estimate::from_str(&mut c, "0.1").unwrap();
        assert!(!est.error().is_zero());
        assert!(est.error().as_f64() < 1e-25);
        assert!((est.value().as_f64() - 0.1).abs() < 1e-17);
        let exact = Estimate::from_str(&mut c, "0.5").unwrap();
        assert_eq!(exact.value().as_f64(), 0.5);
        assert!(Estimate::from_str(&mut c, "1..2").is_err());
    }

    #[test]
    fn error_accessors() {
        let c = ctx();
        let mut est = Estimate::from_f64(&c, 3.0);
        assert!(est.error().is_zero());
        est.add_error(&Estimate::from_f64(&c, -0.5));
        assert_eq!(est.error().as_f64(), 0.5);
        assert_eq!(est.get_error().value().as_f64(), 0.5);
        est.set_error(&Estimate::from_f64(&c, 0.25));
        assert_eq!(est.error().as_f64(), 0.25);
        est.set_error_zero();
        assert!(est.error().is_zero());
    }

    #[test]
    fn magnitude_bounds_enclose_the_interval() {
        let c = ctx();
        let mut est = Estimate::from_f64(&c, -3.0);
        est.add_error(&Estimate::from_f64(&c, 0.5));
        assert_eq!(est.magnitude_above().as_f64(), 3.5);
        assert_eq!(est.magnitude_below().as_f64(), 2.5);
        est.widen(ErrorEstimate::from_f64(3.0));
        assert_eq!(est.error().as_f64(), 3.5);
        assert!(est.magnitude_below().is_zero());
    }

    #[test]
    fn relative_error_counts_bits() {
        let c = ctx();
        let mut est = Estimate::from_f64(&c, 1.0);
        est.add_error(&Estimate::from_f64(&c, 2f64.powi(-20)));
        assert_eq!(est.relative_error(), 19);
    }

    #[test]
    fn precision_passes_through() {
        let c = ctx();
        let mut est = Estimate::from_f64(&c, 1.0);
        assert_eq!(est.precision(), 4);
        est.set_precision(2);
        assert_eq!(est.precision(), 2);
    }

    #[test]
    fn display_shows_value_and_error() {
        let c = ctx();
        let mut est = Estimate::from_f64(&c, 1.5);
        est.add_error(&Estimate::from_f64(&c, 0.125));
        assert_eq!(est.to_string(), "1.5000000000000000000e+0 ± 1.25e-1");
    }
}
