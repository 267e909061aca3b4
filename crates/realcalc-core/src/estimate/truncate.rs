//! Clipping approximation intervals to a function's domain.
//!
//! Closed domain ends (`sqrt` at 0, `asin` at ±1) cannot be decided for an
//! argument that straddles them. Instead the part of the interval outside
//! the domain is thrown away; only an interval lying provably outside raises
//! `Domain`. Errors in the bounds themselves widen the result, so prefer
//! exact bounds.

use crate::error_estimate::{ErrorEstimate, RoundingMode};
use crate::{Context, RealError};

use super::Estimate;

impl Estimate {
    /// Drop the negative part of the interval.
    pub fn truncate_negative(&self, ctx: &mut Context) -> Result<Self, RealError> {
        if !self.value.is_finite() {
            return Err(RealError::Domain(format!("{self} is not finite")));
        }
        if self.certainly_negative() {
            return Err(RealError::Domain(format!("{self} is negative")));
        }
        if self.certainly_positive() {
            return Ok(self.clone());
        }
        // [0, v + e], centered.
        let words = self.value.word_count();
        let top = self
            .value
            .add(&self.error.as_longfloat(words), ctx.kernel_mut());
        // The sign tests compare only the leading bits of the value, so a
        // negative interval can reach this point.
        if top.is_negative() || top.is_zero() {
            return Err(RealError::Domain(format!("{self} is negative")));
        }
        let rounding = ErrorEstimate::rounding_error(&top, top.rounding_error_add());
        let center = top.shr(1);
        let err = ErrorEstimate::from_longfloat(&center, RoundingMode::Up).add(rounding);
        Ok(Self::new(center, err))
    }

    /// Drop the part of the interval below `low`.
    pub fn truncate_below(&self, low: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        let above = self.sub(low, ctx).truncate_negative(ctx)?;
        Ok(above.add(low, ctx))
    }

    /// Drop the part of the interval above `high`.
    pub fn truncate_above(&self, high: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        let below = high.sub(self, ctx).truncate_negative(ctx)?;
        Ok(high.sub(&below, ctx))
    }

    /// Clip the interval to `[low, high]`.
    pub fn truncate_to(&self, low: &Self, high: &Self, ctx: &mut Context) -> Result<Self, RealError> {
        let above = self.sub(low, ctx).truncate_negative(ctx)?;
        let room = high.sub(low, ctx).sub(&above, ctx).truncate_negative(ctx)?;
        Ok(high.sub(&room, ctx))
    }

    pub fn truncate_to_f64(&self, low: f64, high: f64, ctx: &mut Context) -> Result<Self, RealError> {
        let low = Self::from_f64(ctx, low);
        let high = Self::from_f64(ctx, high);
        self.truncate_to(&low, &high, ctx)
    }
}
