//! Capability shared by interval-valued number types.
//!
//! Evaluators written against [`Interval`] run unchanged on any backend
//! that tracks a value and its error, whatever its precision model.

use crate::{Context, Estimate, RealError};

/// Operations an interval number type provides to generic evaluators.
pub trait Interval: Sized {
    /// State threaded through every operation that may round.
    type Context;
    /// Failure raised when a result cannot be bounded.
    type Error;

    fn neg(&self) -> Self;

    /// Reciprocal; fails when the interval is not provably nonzero.
    fn recip(&self, ctx: &mut Self::Context) -> Result<Self, Self::Error>;

    fn mul(&self, rhs: &Self, ctx: &mut Self::Context) -> Self;

    /// Multiply by a machine integer.
    fn mul_fast(&self, k: i32) -> Self;

    fn div(&self, rhs: &Self, ctx: &mut Self::Context) -> Result<Self, Self::Error>;

    /// Divide by a machine integer.
    fn div_fast(&self, k: i32) -> Result<Self, Self::Error>;

    /// `lhs / self`.
    fn div_by(&self, lhs: i32, ctx: &mut Self::Context) -> Result<Self, Self::Error> {
        Ok(self.recip(ctx)?.mul_fast(lhs))
    }
}

impl Interval for Estimate {
    type Context = Context;
    type Error = RealError;

    fn neg(&self) -> Self {
        Estimate::neg(self)
    }

    fn recip(&self, ctx: &mut Context) -> Result<Self, RealError> {
        Estimate::recip(self, ctx)
    }

    fn mul(&self, rhs: &Self, ctx: &mut Context) -> Self {
        Estimate::mul(self, rhs, ctx)
    }

    fn mul_fast(&self, k: i32) -> Self {
        Estimate::mul_fast(self, k)
    }

    fn div(&self, rhs: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        Estimate::div(self, rhs, ctx)
    }

    fn div_fast(&self, k: i32) -> Result<Self, RealError> {
        Estimate::div_fast(self, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `−k / (x · y)` through the trait only.
    fn scaled_inverse_product<I: Interval>(
        x: &I,
        y: &I,
        k: i32,
        ctx: &mut I::Context,
    ) -> Result<I, I::Error> {
        Ok(x.mul(y, ctx).div_by(k, ctx)?.neg())
    }

    #[test]
    fn generic_evaluation_on_estimates() {
        let mut c = Context::with_precision(4).unwrap();
        let x = Estimate::from_i32(&c, 4);
        let y = Estimate::from_f64(&c, 0.5);
        let r = scaled_inverse_product(&x, &y, 6, &mut c).unwrap();
        assert!((r.value().as_f64() + 3.0).abs() < 1e-15);
        assert!(r.error().as_f64() < 1e-25);
    }

    #[test]
    fn trait_methods_match_inherent_ones() {
        let mut c = Context::with_precision(4).unwrap();
        let x = Estimate::from_f64(&c, 3.0);
        let three = Interval::div_fast(&x, 3).unwrap();
        assert_eq!(three.value().as_f64(), 1.0);
        let q = Interval::div(&x, &Interval::mul_fast(&x, 2), &mut c).unwrap();
        assert!((q.value().as_f64() - 0.5).abs() < 1e-15);
        let zero = Estimate::from_f64(&c, 0.0);
        assert!(Interval::recip(&zero, &mut c).unwrap_err().is_precision());
    }
}
