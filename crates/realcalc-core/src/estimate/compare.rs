//! Strong and weak comparisons.
//!
//! Strong comparisons decide the relation of the approximated real numbers
//! and fail with `Precision` when the error intervals overlap. Equality of
//! reals is undecidable, so there is no strong `eq`, `le` or `ge`.
//!
//! Weak comparisons look at the central values only. They are for choosing
//! between transformations that are valid either way, such as evaluating
//! `sin(x)` or `sin(π − x)`.

use crate::error_estimate::{ErrorEstimate, RoundingMode};
use crate::{Context, RealError};

use super::Estimate;

impl Estimate {
    /// Is `|value|` provably larger than the error? Infinite and NaN values
    /// are never certain.
    fn magnitude_exceeds_error(&self) -> bool {
        self.value.is_normal()
            && ErrorEstimate::from_longfloat(&self.value, RoundingMode::Down) > self.error
    }

    #[must_use]
    pub fn certainly_positive(&self) -> bool {
        !self.value.is_negative() && self.magnitude_exceeds_error()
    }

    #[must_use]
    pub fn certainly_negative(&self) -> bool {
        self.value.is_negative() && self.magnitude_exceeds_error()
    }

    #[must_use]
    pub fn certainly_non_zero(&self) -> bool {
        self.magnitude_exceeds_error()
    }

    pub(crate) fn certainly_lt(&self, rhs: &Self, ctx: &mut Context) -> bool {
        self.sub(rhs, ctx).certainly_negative()
    }

    pub(crate) fn certainly_gt(&self, rhs: &Self, ctx: &mut Context) -> bool {
        self.sub(rhs, ctx).certainly_positive()
    }

    fn undecidable(&self, question: &str) -> RealError {
        RealError::Precision(format!("cannot decide whether {self} {question}"))
    }

    pub fn is_positive(&self) -> Result<bool, RealError> {
        if self.certainly_positive() {
            Ok(true)
        } else if self.certainly_negative() {
            Ok(false)
        } else {
            Err(self.undecidable("is positive"))
        }
    }

    pub fn is_negative(&self) -> Result<bool, RealError> {
        if self.certainly_negative() {
            Ok(true)
        } else if self.certainly_positive() {
            Ok(false)
        } else {
            Err(self.undecidable("is negative"))
        }
    }

    /// A nonzero real is eventually recognised; zero never is.
    pub fn is_non_zero(&self) -> Result<bool, RealError> {
        if self.certainly_non_zero() {
            Ok(true)
        } else {
            Err(self.undecidable("is nonzero"))
        }
    }

    pub fn lt(&self, rhs: &Self, ctx: &mut Context) -> Result<bool, RealError> {
        self.sub(rhs, ctx).is_negative()
    }

    pub fn gt(&self, rhs: &Self, ctx: &mut Context) -> Result<bool, RealError> {
        self.sub(rhs, ctx).is_positive()
    }

    pub fn ne(&self, rhs: &Self, ctx: &mut Context) -> Result<bool, RealError> {
        self.sub(rhs, ctx).is_non_zero()
    }

    #[must_use]
    pub fn weak_is_positive(&self) -> bool {
        self.value.is_normal() && !self.value.is_negative()
    }

    #[must_use]
    pub fn weak_is_negative(&self) -> bool {
        self.value.is_normal() && self.value.is_negative()
    }

    /// Always true for finite estimates: zero values are replaced on
    /// construction.
    #[must_use]
    pub fn weak_is_non_zero(&self) -> bool {
        !self.value.is_zero()
    }

    #[must_use]
    pub fn weak_lt(&self, rhs: &Self) -> bool {
        self.value < rhs.value
    }

    #[must_use]
    pub fn weak_gt(&self, rhs: &Self) -> bool {
        rhs.weak_lt(self)
    }

    #[must_use]
    pub fn weak_le(&self, rhs: &Self) -> bool {
        !self.weak_gt(rhs)
    }

    #[must_use]
    pub fn weak_ge(&self, rhs: &Self) -> bool {
        !self.weak_lt(rhs)
    }

    #[must_use]
    pub fn weak_eq(&self, rhs: &Self) -> bool {
        self.value == rhs.value
    }

    #[must_use]
    pub fn weak_ne(&self, rhs: &Self) -> bool {
        !self.weak_eq(rhs)
    }

    /// The central value rounded to an integer, taken as exact. Only
    /// meaningful for periodic functions, where any nearby integer will do.
    #[must_use]
    pub fn weak_round(&self) -> Self {
        Self::exact(self.value.round())
    }

    /// Bit exponent `b` of the central value: `|value| · 2^−b ∈ [0.5, 1)`.
    #[must_use]
    pub fn weak_normalize(&self) -> i32 {
        self.value.normalize()
    }

    #[must_use]
    pub fn weak_center(&self) -> Self {
        Self::exact(self.value.clone())
    }

    #[must_use]
    pub fn weak_as_f64(&self) -> f64 {
        self.value.as_f64()
    }

    #[must_use]
    pub fn weak_as_decimal(&self, digits: usize, ctx: &mut Context) -> String {
        self.value.as_decimal(digits, ctx.kernel_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy(ctx: &Context, v: f64, e: f64) -> Estimate {
        let mut est = Estimate::from_f64(ctx, v);
        est.add_error(&Estimate::from_f64(ctx, e));
        est
    }

    #[test]
    fn strong_signs() {
        let c = Context::with_precision(3).unwrap();
        assert_eq!(fuzzy(&c, 1.0, 0.5).is_positive(), Ok(true));
        assert_eq!(fuzzy(&c, 1.0, 0.5).is_negative(), Ok(false));
        assert_eq!(fuzzy(&c, -1.0, 0.5).is_negative(), Ok(true));
        assert_eq!(fuzzy(&c, -1.0, 0.5).is_non_zero(), Ok(true));
        assert!(fuzzy(&c, 1.0, 1.0).is_positive().unwrap_err().is_precision());
        assert!(fuzzy(&c, 0.1, 2.0).is_non_zero().is_err());
        assert!(!fuzzy(&c, 1.0, 1.0).certainly_non_zero());
    }

    #[test]
    fn strong_relations() {
        let mut c = Context::with_precision(3).unwrap();
        let a = fuzzy(&c, 1.0, 0.1);
        let b = fuzzy(&c, 2.0, 0.1);
        assert_eq!(a.lt(&b, &mut c), Ok(true));
        assert_eq!(a.gt(&b, &mut c), Ok(false));
        assert_eq!(b.gt(&a, &mut c), Ok(true));
        assert_eq!(a.ne(&b, &mut c), Ok(true));
        let near = fuzzy(&c, 1.05, 0.1);
        assert!(a.lt(&near, &mut c).unwrap_err().is_precision());
        assert!(a.certainly_lt(&b, &mut c));
        assert!(!a.certainly_gt(&near, &mut c));
    }

    #[test]
    fn weak_relations_ignore_error() {
        let c = Context::with_precision(3).unwrap();
        let a = fuzzy(&c, 1.0, 5.0);
        let b = fuzzy(&c, 1.5, 0.0);
        assert!(a.weak_lt(&b) && a.weak_le(&b) && !a.weak_ge(&b));
        assert!(b.weak_gt(&a) && b.weak_ne(&a));
        assert!(a.weak_eq(&fuzzy(&c, 1.0, 0.0)));
        assert!(a.weak_le(&a) && a.weak_ge(&a));
        assert!(a.weak_is_positive() && !a.weak_is_negative());
        assert!(a.weak_is_non_zero());
        assert!(Estimate::from_f64(&c, 0.0).weak_is_non_zero());
    }

    #[test]
    fn weak_conversions() {
        let mut c = Context::with_precision(3).unwrap();
        let x = fuzzy(&c, -2.5, 1.0);
        assert_eq!(x.weak_round().weak_as_f64(), -3.0);
        assert!(x.weak_round().error().is_zero());
        assert_eq!(x.weak_normalize(), 2);
        assert!(x.weak_center().error().is_zero());
        assert_eq!(x.weak_center().weak_as_f64(), -2.5);
        assert_eq!(x.weak_as_decimal(3, &mut c), "-2.50e+0");
    }
}
