//! Elementary functions on estimates.
//!
//! Each function reduces its argument to a primary interval, evaluates there
//! with a series or Newton iteration, and undoes the reduction. Arguments
//! whose position relative to a branch point cannot be decided fail with
//! `Precision`; arguments provably outside the domain fail with `Domain`.

use tracing::debug;

use crate::error_estimate::{ErrorEstimate, RoundingMode};
use crate::{Context, RealError};

use super::series::{asin_primary, exp_primary, log_primary, nr_iter, rpi, sin_primary, SEED_BITS};
use super::Estimate;

/// Bound on `|x|` (in turns) that `sin` accepts after removing whole turns.
const SIN_TURN_BOUND: f64 = 0.6125;
/// Above this `asin` switches to `π/2 − asin(√(1 − x²))`.
const ASIN_DIRECT_LIMIT: f64 = 0.708;

/// Newton iteration for `1/√v` at the centre `v` of `arg`, from an `f64`
/// seed of the mantissa. The error of `arg` is left to the caller.
fn rsqrt_newton(arg: &Estimate, ctx: &mut Context) -> Result<Estimate, RealError> {
    let center = arg.weak_center();
    let mut exp = center.weak_normalize();
    if exp & 1 != 0 {
        exp -= 1;
    }
    let d = 1.0 / center.shr(exp).weak_as_f64().sqrt();
    let seed = Estimate::from_f64(ctx, d).shr(exp / 2);
    let half = center.shr(1);
    nr_iter(ctx, half, seed, SEED_BITS, |ctx, arg, est, prec| {
        let ee = est.sq(ctx).mul(arg, ctx);
        let factor = Estimate::from_f64(ctx, 1.5).sub(&ee, ctx);
        est.mul_assign(&factor, ctx);
        Ok(2 * prec - 3)
    })
}

impl Estimate {
    /// `1/√self`. The argument must be provably positive.
    pub fn rsqrt(&self, ctx: &mut Context) -> Result<Self, RealError> {
        if self.certainly_negative() {
            return Err(RealError::Domain(format!("rsqrt of negative {self}")));
        }
        if !self.certainly_positive() {
            return Err(RealError::Precision(format!("rsqrt of {self}")));
        }
        let mut r = rsqrt_newton(self, ctx)?;
        // (v − e)^(−1/2) − v^(−1/2) ≤ r·e/(v − e)
        let spread = r
            .magnitude_above()
            .mul(self.error())
            .div(self.magnitude_below());
        r.widen(spread);
        Ok(r)
    }

    /// `√self`. The negative part of the interval is dropped, so arguments
    /// straddling zero succeed.
    pub fn sqrt(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let arg = self.truncate_negative(ctx)?;
        let r = rsqrt_newton(&arg, ctx)?;
        let mut s = arg.weak_center().mul(&r, ctx);
        // |√x − √v| ≤ e/√v on [max(0, v − e), v + e].
        s.widen(arg.error().mul(r.magnitude_above()));
        Ok(s)
    }

    /// π at the context's precision, computed once and cached.
    pub fn pi(ctx: &mut Context) -> Result<Self, RealError> {
        let precision = ctx.precision();
        if let Some(pi) = ctx.cached_pi(precision) {
            return Ok(pi);
        }
        debug!(precision, "computing pi");
        let pi = rpi(ctx)?.recip(ctx)?;
        ctx.store_pi(&pi);
        Ok(pi)
    }

    /// ln 2 at the context's precision, computed once and cached.
    pub fn ln2(ctx: &mut Context) -> Result<Self, RealError> {
        let precision = ctx.precision();
        if let Some(ln2) = ctx.cached_ln2(precision) {
            return Ok(ln2);
        }
        debug!(precision, "computing ln 2");
        let two = Self::from_i32(ctx, 2);
        let ln2 = log_primary(ctx, &two)?;
        ctx.store_ln2(&ln2);
        Ok(ln2)
    }

    /// `e^self`, reduced by multiples of ln 2.
    pub fn exp(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let l = Self::ln2(ctx)?;
        let x = self.div(&l, ctx)?;
        let e = x.weak_round();
        let x = x.sub(&e, ctx).mul(&l, ctx);
        let shift = e
            .value()
            .to_i32()
            .ok_or_else(|| RealError::InvalidArgument(format!("exp of {self} overflows")))?;
        Ok(exp_primary(ctx, &x)?.shl(shift))
    }

    /// Natural logarithm. The argument must be provably positive.
    pub fn log(&self, ctx: &mut Context) -> Result<Self, RealError> {
        if self.certainly_negative() {
            return Err(RealError::Domain(format!("log of negative {self}")));
        }
        if !self.certainly_positive() {
            return Err(RealError::Precision(format!("log of {self}")));
        }
        let l = Self::ln2(ctx)?;
        let e = self.weak_normalize();
        let m = log_primary(ctx, &self.shr(e))?;
        Ok(m.add(&l.mul_fast(e), ctx))
    }

    /// `√(1 − self²)`.
    fn cos_from_sin(&self, ctx: &mut Context) -> Result<Self, RealError> {
        Self::from_i32(ctx, 1).sub(&self.sq(ctx), ctx).sqrt(ctx)
    }

    /// `self / 2π` with whole turns removed.
    fn turns(&self, two_pi: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        let x = self.div(two_pi, ctx)?;
        let whole = x.weak_round();
        Ok(x.sub(&whole, ctx))
    }

    pub fn sin(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let two_pi = Self::pi(ctx)?.mul_fast(2);
        let mut x = self.turns(&two_pi, ctx)?;
        let bound = Self::from_f64(ctx, SIN_TURN_BOUND);
        if !(x.certainly_lt(&bound, ctx) && x.certainly_gt(&bound.neg(), ctx)) {
            return Err(RealError::Precision(format!("sin of {self}")));
        }
        let quarter = Self::from_f64(ctx, 0.25);
        let half = Self::from_f64(ctx, 0.5);
        if x.weak_gt(&quarter) {
            x = half.sub(&x, ctx);
        } else if x.weak_lt(&quarter.neg()) {
            x = half.neg().sub(&x, ctx);
        }
        let xa = x.mul(&two_pi, ctx);
        sin_primary(ctx, &xa)
    }

    pub fn cos(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let half_pi = Self::pi(ctx)?.div_fast(2)?;
        half_pi.sub(self, ctx).sin(ctx)
    }

    /// Tangent. Arguments that cannot be separated from a pole fail with
    /// `Precision`.
    pub fn tan(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let two_pi = Self::pi(ctx)?.mul_fast(2);
        let mut x = self.turns(&two_pi, ctx)?;
        let quarter = Self::from_f64(ctx, 0.25);
        let half = Self::from_f64(ctx, 0.5);
        let mut negate = false;
        if x.certainly_gt(&quarter, ctx) {
            x = half.sub(&x, ctx);
            negate = true;
        } else if !x.certainly_lt(&quarter, ctx) {
            return Err(RealError::Precision(format!("tan of {self}")));
        } else if x.certainly_lt(&quarter.neg(), ctx) {
            x = half.neg().sub(&x, ctx);
            negate = true;
        } else if !x.certainly_gt(&quarter.neg(), ctx) {
            return Err(RealError::Precision(format!("tan of {self}")));
        }
        let xa = x.mul(&two_pi, ctx);
        let s = sin_primary(ctx, &xa)?;
        let c = s.cos_from_sin(ctx)?;
        let s = if negate { s.neg() } else { s };
        s.div(&c, ctx)
    }

    /// Arcsine. The argument is clipped to `[−1, 1]`; only an interval
    /// entirely outside fails with `Domain`.
    pub fn asin(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let x = self.truncate_to_f64(-1.0, 1.0, ctx)?;
        let limit = Self::from_f64(ctx, ASIN_DIRECT_LIMIT);
        if x.weak_gt(&limit) {
            let half_pi = Self::pi(ctx)?.div_fast(2)?;
            let c = x.cos_from_sin(ctx)?;
            Ok(half_pi.sub(&asin_primary(ctx, &c)?, ctx))
        } else if x.weak_lt(&limit.neg()) {
            let half_pi = Self::pi(ctx)?.div_fast(2)?;
            let c = x.cos_from_sin(ctx)?;
            Ok(half_pi.neg().add(&asin_primary(ctx, &c)?, ctx))
        } else {
            asin_primary(ctx, &x)
        }
    }

    pub fn acos(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let half_pi = Self::pi(ctx)?.div_fast(2)?;
        Ok(half_pi.sub(&self.asin(ctx)?, ctx))
    }

    /// `atan(x) = asin(x / √(x² + 1))`.
    pub fn atan(&self, ctx: &mut Context) -> Result<Self, RealError> {
        let one = Self::from_i32(ctx, 1);
        let r = self.sq(ctx).add(&one, ctx).rsqrt(ctx)?;
        self.mul(&r, ctx).asin(ctx)
    }

    /// Angle of the point `(x, self)`, in `(−π, π]`.
    ///
    /// When `x` cannot be separated from zero the result is still bounded
    /// as long as the sign of `self` is known: `±π/2`, widened by
    /// `max|x| / min|y|`. With neither sign known the result is `0 ± π`.
    pub fn atan2(&self, x: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        let y = self;
        let pi = Self::pi(ctx)?;
        if x.certainly_positive() {
            return y.div(x, ctx)?.atan(ctx);
        }
        if x.certainly_negative() {
            let a = y.div(&x.neg(), ctx)?.atan(ctx)?;
            return if y.certainly_positive() {
                Ok(pi.sub(&a, ctx))
            } else if y.certainly_negative() {
                Ok(pi.neg().sub(&a, ctx))
            } else {
                Err(RealError::Precision(format!("atan2 of {y} on the negative axis")))
            };
        }
        if y.certainly_non_zero() {
            let x_max = ErrorEstimate::from_longfloat(x.value(), RoundingMode::Up).add(x.error());
            let y_min = ErrorEstimate::from_longfloat(y.value(), RoundingMode::Down)
                .checked_sub(y.error())
                .unwrap_or(ErrorEstimate::ZERO);
            let spread = Self::exact(x_max.div(y_min).as_longfloat(ctx.precision()));
            let mut r = pi.div_fast(if y.certainly_positive() { 2 } else { -2 })?;
            r.add_error(&spread);
            return Ok(r);
        }
        let mut r = Self::from_i32(ctx, 0);
        r.set_error(&pi);
        Ok(r)
    }
}
