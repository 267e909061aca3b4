//! Estimate arithmetic with error propagation.

use crate::error_estimate::{ErrorEstimate, RoundingMode};
use crate::longfloat::LongFloat;
use crate::{Context, RealError};

use super::Estimate;

fn upper(lf: &LongFloat) -> ErrorEstimate {
    ErrorEstimate::from_longfloat(lf, RoundingMode::Up)
}

fn lower(lf: &LongFloat) -> ErrorEstimate {
    ErrorEstimate::from_longfloat(lf, RoundingMode::Down)
}

/// Rounding error of `s = a ± b`, taken at the largest word exponent among
/// the operands and the result so that cancellation cannot hide it.
fn add_rounding(a: &LongFloat, b: &LongFloat, s: &LongFloat) -> ErrorEstimate {
    if !s.is_finite() {
        return ErrorEstimate::INFINITE;
    }
    [a, b, s]
        .into_iter()
        .filter(|x| x.is_normal())
        .map(LongFloat::exponent)
        .max()
        .map_or(ErrorEstimate::ZERO, |e| {
            ErrorEstimate::rounding_error_at(e, s.rounding_error_add())
        })
}

impl Estimate {
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            value: self.value.neg(),
            error: self.error,
        }
    }

    pub fn neg_assign(&mut self) {
        self.value.neg_assign();
    }

    #[must_use]
    pub fn add(&self, rhs: &Self, ctx: &mut Context) -> Self {
        let s = self.value.add(&rhs.value, ctx.kernel_mut());
        let re = add_rounding(&self.value, &rhs.value, &s);
        Self::new(s, self.error.add(rhs.error).add(re))
    }

    pub fn add_assign(&mut self, rhs: &Self, ctx: &mut Context) {
        *self = self.add(rhs, ctx);
    }

    #[must_use]
    pub fn sub(&self, rhs: &Self, ctx: &mut Context) -> Self {
        let s = self.value.sub(&rhs.value, ctx.kernel_mut());
        let re = add_rounding(&self.value, &rhs.value, &s);
        Self::new(s, self.error.add(rhs.error).add(re))
    }

    pub fn sub_assign(&mut self, rhs: &Self, ctx: &mut Context) {
        *self = self.sub(rhs, ctx);
    }

    /// Product; the error is `e1·e2 + e1·|v2| + e2·|v1|` plus rounding.
    #[must_use]
    pub fn mul(&self, rhs: &Self, ctx: &mut Context) -> Self {
        let r = self.value.mul(&rhs.value, ctx.kernel_mut());
        let e = self
            .error
            .mul(rhs.error)
            .add(self.error.mul(upper(&rhs.value)))
            .add(rhs.error.mul(upper(&self.value)))
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_mul()));
        Self::new(r, e)
    }

    pub fn mul_assign(&mut self, rhs: &Self, ctx: &mut Context) {
        *self = self.mul(rhs, ctx);
    }

    /// `1 / self`. Fails with `Precision` unless `self` is provably nonzero.
    pub fn recip(&self, ctx: &mut Context) -> Result<Self, RealError> {
        if !self.certainly_non_zero() {
            return Err(RealError::Precision(format!(
                "reciprocal of {self}, which may be zero"
            )));
        }
        let r = self.value.recip(ctx.kernel_mut());
        let e = lower(&self.value);
        // Dividing by a rounded-down denominator keeps the bound an upper one.
        let err = self
            .error
            .div(e.sub(self.error))
            .div(e)
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_div()));
        Ok(Self::new(r, err))
    }

    pub fn recip_assign(&mut self, ctx: &mut Context) -> Result<(), RealError> {
        *self = self.recip(ctx)?;
        Ok(())
    }

    /// Quotient. Fails with `Precision` unless `rhs` is provably nonzero.
    pub fn div(&self, rhs: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        if !rhs.certainly_non_zero() {
            return Err(RealError::Precision(format!(
                "division by {rhs}, which may be zero"
            )));
        }
        let r = self.value.div(&rhs.value, ctx.kernel_mut());
        let e = lower(&rhs.value);
        let num = upper(&self.value)
            .mul(rhs.error)
            .add(upper(&rhs.value).mul(self.error));
        let err = num
            .div(e.sub(rhs.error))
            .div(e)
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_div()));
        Ok(Self::new(r, err))
    }

    pub fn div_assign(&mut self, rhs: &Self, ctx: &mut Context) -> Result<(), RealError> {
        *self = self.div(rhs, ctx)?;
        Ok(())
    }

    /// Multiply by a machine integer.
    #[must_use]
    pub fn mul_fast(&self, k: i32) -> Self {
        let r = self.value.mul_i32(k);
        let err = self
            .error
            .mul(ErrorEstimate::from_f64(f64::from(k)))
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_add()));
        Self::new(r, err)
    }

    pub fn mul_fast_assign(&mut self, k: i32) {
        *self = self.mul_fast(k);
    }

    /// Divide by a machine integer; zero fails with `Precision`.
    pub fn div_fast(&self, k: i32) -> Result<Self, RealError> {
        if k == 0 {
            return Err(RealError::Precision(format!("{self} divided by zero")));
        }
        let r = self.value.div_i32(k);
        let err = self
            .error
            .div(ErrorEstimate::from_f64(f64::from(k)))
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_add()));
        Ok(Self::new(r, err))
    }

    pub fn div_fast_assign(&mut self, k: i32) -> Result<(), RealError> {
        *self = self.div_fast(k)?;
        Ok(())
    }

    /// `lhs / self`.
    pub fn div_by(&self, lhs: i32, ctx: &mut Context) -> Result<Self, RealError> {
        Ok(self.recip(ctx)?.mul_fast(lhs))
    }

    /// Multiply by `2^bits`.
    #[must_use]
    pub fn shl(&self, bits: i32) -> Self {
        let v = self.value.shl(bits);
        let err = self
            .error
            .shl(bits)
            .add(ErrorEstimate::rounding_error(&v, v.rounding_error_add()));
        Self::new(v, err)
    }

    #[must_use]
    pub fn shr(&self, bits: i32) -> Self {
        self.shl(bits.saturating_neg())
    }

    /// Square; tighter than `self.mul(self)` since both factors err together.
    #[must_use]
    pub fn sq(&self, ctx: &mut Context) -> Self {
        let r = self.value.sq(ctx.kernel_mut());
        let e = self
            .error
            .mul(self.error)
            .add(self.error.mul(upper(&self.value)).shl(1))
            .add(ErrorEstimate::rounding_error(&r, r.rounding_error_mul()));
        Self::new(r, e)
    }

    /// Integer power by repeated squaring. Negative powers take the
    /// reciprocal first and fail like [`Estimate::recip`].
    pub fn pow(&self, power: i32, ctx: &mut Context) -> Result<Self, RealError> {
        let mut base = if power < 0 {
            self.recip(ctx)?
        } else {
            self.clone()
        };
        let mut acc = Self::from_i32(ctx, 1);
        let mut left = power.unsigned_abs();
        while left != 0 {
            if left & 1 != 0 {
                acc = acc.mul(&base, ctx);
            }
            left >>= 1;
            if left != 0 {
                base = base.sq(ctx);
            }
        }
        Ok(acc)
    }

    /// Absolute value. When the sign is undecidable the result is the
    /// interval `[0, |v| + e]`, centered.
    #[must_use]
    pub fn abs(&self, ctx: &mut Context) -> Self {
        if self.certainly_positive() {
            return self.clone();
        }
        if self.certainly_negative() {
            return self.neg();
        }
        let a = if self.weak_is_positive() {
            self.clone()
        } else {
            self.neg()
        };
        let mut a = a.add(&a.get_error(), ctx).shr(1);
        let bound = a.clone();
        a.set_error(&bound);
        a
    }
}
