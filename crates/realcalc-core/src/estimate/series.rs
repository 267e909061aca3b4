//! Iteration drivers and the primary-interval evaluators they power.
//!
//! Newton iterations start from an `f64` seed and roughly double the
//! number of correct bits per step, so each step runs at just enough
//! precision for the bits it can produce. The error is reset before every
//! step: only the last step, run at full precision, determines the bound.

use tracing::trace;

use crate::error_estimate::ErrorEstimate;
use crate::{Context, RealError};

use super::Estimate;

/// Correct bits of a seed computed in `f64`.
pub(crate) const SEED_BITS: i64 = 50;
/// Base-3 argument reductions per word in `sin_primary`.
const SIN_REDUCTIONS_PER_WORD: f64 = 20.2;
/// `3^19`, the largest power of three below `i32::MAX`.
const POW3_19: i32 = 1_162_261_467;
/// Series index from which `2i·(2i + 1)` is split into two divisions.
const SIN_SPLIT_INDEX: i32 = 16_000;

/// Newton-Raphson driver.
///
/// `step(ctx, arg, est, prec)` refines `est`, which carries `prec` correct
/// bits on entry, and returns the correct bits it carries afterwards. Steps
/// run at `prec/16 + 2` words until the estimate holds half the working
/// precision plus 32 bits; the final step then runs at full precision. Its
/// truncation error lies far below its rounding error, so the error it
/// accumulates is the bound of the result for an exact `arg`. The error of
/// an inexact `arg` passes through the step only to first order: callers
/// iterate on the centre and bound the spread over the interval themselves.
pub(crate) fn nr_iter<F>(
    ctx: &mut Context,
    mut arg: Estimate,
    mut est: Estimate,
    start_prec: i64,
    mut step: F,
) -> Result<Estimate, RealError>
where
    F: FnMut(&mut Context, &Estimate, &mut Estimate, i64) -> Result<i64, RealError>,
{
    let full = arg.precision();
    let full_bits = i64::try_from(full).unwrap_or(i64::MAX / 64) * 32;
    let needed = full_bits / 2 + 32;
    let words = |bits: i64| usize::try_from(bits / 32 + 2).map_or(full, |w| w.min(full));
    let mut prec = start_prec;
    while prec < needed {
        let w = words(2 * prec);
        arg.set_precision(w);
        est.set_precision(w);
        est.set_error_zero();
        prec = step(ctx, &arg, &mut est, prec)?;
        trace!(prec, needed, words = w, "newton step");
    }
    arg.set_precision(full);
    est.set_precision(full);
    est.set_error_zero();
    step(ctx, &arg, &mut est, prec)?;
    trace!(words = full, error = est.error().as_f64(), "newton final step");
    Ok(est)
}

/// Power series driver: for each index in `start..end`, `term` turns the
/// workspace into the next term, which is added to `sum`. The last term
/// bounds the tail and is added to the error.
pub(crate) fn ps_direct_iter<F>(
    ctx: &mut Context,
    arg: &Estimate,
    sum: &mut Estimate,
    workspace: &mut Estimate,
    start: i32,
    end: i32,
    mut term: F,
) -> Result<(), RealError>
where
    F: FnMut(&mut Context, &Estimate, &mut Estimate, i32) -> Result<(), RealError>,
{
    for idx in start..end {
        term(ctx, arg, workspace, idx)?;
        sum.add_assign(workspace, ctx);
    }
    sum.add_error(workspace);
    Ok(())
}

/// Word count as a float, for sizing series.
#[allow(clippy::cast_precision_loss)]
fn precision_f64(est: &Estimate) -> f64 {
    est.precision() as f64
}

/// `exp(x)` for `x` in `[−1, 1]`: Taylor series on `x / 2^i`, squared `i`
/// times, with `i ≈ √(32·p)`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn exp_primary(ctx: &mut Context, arg: &Estimate) -> Result<Estimate, RealError> {
    let i = (32.0 * precision_f64(arg)).sqrt().ceil() as i32;
    let x = arg.shr(i);
    let mut workspace = x.clone();
    let mut sum = x.add(&Estimate::from_i32(ctx, 1), ctx);
    ps_direct_iter(ctx, &x, &mut sum, &mut workspace, 2, i, |ctx, x, ws, idx| {
        ws.mul_assign(x, ctx);
        ws.div_fast_assign(idx)
    })?;
    for _ in 0..i {
        sum = sum.sq(ctx);
    }
    Ok(sum)
}

/// `ln(x)` for `x` in `[1/e, e]`: Newton on `exp_primary` at the centre `v`.
/// Over `[v − e, v + e]` the logarithm moves by at most `e/(v − e)`.
pub(crate) fn log_primary(ctx: &mut Context, arg: &Estimate) -> Result<Estimate, RealError> {
    let seed = Estimate::from_f64(ctx, arg.weak_as_f64().ln());
    let mut est = nr_iter(ctx, arg.weak_center(), seed, SEED_BITS, |ctx, arg, est, prec| {
        let ex = exp_primary(ctx, est)?;
        let delta = arg.sub(&ex, ctx).div(&ex, ctx)?;
        est.add_assign(&delta, ctx);
        Ok(2 * prec - 2)
    })?;
    est.widen(arg.error().div(arg.magnitude_below()));
    Ok(est)
}

/// `sin(x)` for `x` in `[−π/2, π/2]`.
///
/// The argument is divided by `3^r`, the Taylor series evaluated with `2r`
/// terms, and the result tripled back `r` times through
/// `sin 3t = sin t · (3 − 4 sin² t)`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn sin_primary(ctx: &mut Context, arg: &Estimate) -> Result<Estimate, RealError> {
    let steps = (SIN_REDUCTIONS_PER_WORD * precision_f64(arg)).sqrt().ceil() as i32;
    let r = ((steps + 1) / 2).max(1);
    let mut x = arg.div_fast(3i32.pow((r % 19).unsigned_abs()))?;
    for _ in 0..r / 19 {
        x.div_fast_assign(POW3_19)?;
    }

    let neg_x2 = x.neg().mul(&x, ctx);
    let mut sum = x.clone();
    let mut workspace = x.clone();
    ps_direct_iter(ctx, &neg_x2, &mut sum, &mut workspace, 1, 2 * r, |ctx, x2, ws, idx| {
        ws.mul_assign(x2, ctx);
        if idx < SIN_SPLIT_INDEX {
            ws.div_fast_assign(2 * idx * (2 * idx + 1))
        } else {
            ws.div_fast_assign(2 * idx)?;
            ws.div_fast_assign(2 * idx + 1)
        }
    })?;

    let three = Estimate::from_i32(ctx, 3);
    for _ in 0..r {
        let factor = three.sub(&sum.sq(ctx).mul_fast(4), ctx);
        sum.mul_assign(&factor, ctx);
    }
    Ok(sum)
}

/// `asin(x)` for `|x| ≤ 0.708`: Newton on `sin_primary` at the centre.
pub(crate) fn asin_primary(ctx: &mut Context, arg: &Estimate) -> Result<Estimate, RealError> {
    let seed = Estimate::from_f64(ctx, arg.weak_as_f64().asin());
    let mut est = nr_iter(ctx, arg.weak_center(), seed, SEED_BITS, |ctx, arg, est, prec| {
        let ex = sin_primary(ctx, est)?;
        let cos = Estimate::from_i32(ctx, 1).sub(&ex.sq(ctx), ctx).rsqrt(ctx)?;
        let delta = arg.sub(&ex, ctx).mul(&cos, ctx);
        est.add_assign(&delta, ctx);
        Ok(2 * prec - 2)
    })?;
    est.widen(asin_spread(arg));
    Ok(est)
}

/// Bound on `|asin x − asin v|` over the interval of `arg`.
///
/// With `m = |v| + e < 1` the slope `1/√(1 − y²)` is at most `1/(1 − m)`;
/// otherwise the range of `asin` caps the spread at `π < 4`.
fn asin_spread(arg: &Estimate) -> ErrorEstimate {
    let e = arg.error();
    if e.is_zero() {
        return e;
    }
    let one = ErrorEstimate::from_f64(1.0);
    let cap = ErrorEstimate::from_f64(4.0);
    match one.checked_sub(arg.magnitude_above()) {
        Some(room) if !room.is_zero() => e.div(room).min(cap),
        _ => cap,
    }
}

/// `1/π` by the quartic Borwein iteration:
///
/// ```text
/// y₀ = √2 − 1,  a₀ = 6 − 4√2
/// z  = (1 − yₖ⁴)^¼,  yₖ₊₁ = (1 − z)/(1 + z)
/// aₖ₊₁ = aₖ·(1 + yₖ₊₁)⁴ − 2^(2k+3)·yₖ₊₁·(1 + yₖ₊₁ + yₖ₊₁²)
/// ```
///
/// Each step quadruples the correct digits; the last change bounds the
/// remaining error.
pub(crate) fn rpi(ctx: &mut Context) -> Result<Estimate, RealError> {
    let limit = i64::try_from(ctx.precision()).unwrap_or(i64::MAX / 128) * 128;
    let one = Estimate::from_i32(ctx, 1);
    let sqrt2 = Estimate::from_i32(ctx, 2).sqrt(ctx)?;
    let mut y = sqrt2.sub(&one, ctx);
    let mut a = Estimate::from_i32(ctx, 6).sub(&sqrt2.mul_fast(4), ctx);
    let mut factor: i64 = 8;
    loop {
        let y4 = y.sq(ctx).sq(ctx);
        let z = one.sub(&y4, ctx).sqrt(ctx)?.sqrt(ctx)?;
        y = one.sub(&z, ctx).div(&one.add(&z, ctx), ctx)?;
        let y1 = y.add(&one, ctx);
        let poly = y.sq(ctx).add(&y1, ctx);
        let k = i32::try_from(factor).map_err(|_| {
            RealError::InvalidArgument(format!("precision {} too large for pi", ctx.precision()))
        })?;
        let correction = y.mul_fast(k).mul(&poly, ctx);
        let next = y1.sq(ctx).sq(ctx).mul(&a, ctx).sub(&correction, ctx);
        trace!(factor, "borwein step");
        factor *= 4;
        if factor >= limit {
            let change = next.sub(&a, ctx);
            a = next;
            a.add_error(&change);
            return Ok(a);
        }
        a = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(est: &Estimate, expected: f64) {
        let v = est.value().as_f64();
        assert!((v - expected).abs() < 1e-15 * expected.abs().max(1.0), "{v} vs {expected}");
        assert!(est.error().as_f64() < 1e-20, "error {}", est.error().as_f64());
    }

    #[test]
    fn exp_primary_values() {
        let mut c = Context::with_precision(4).unwrap();
        let half = Estimate::from_f64(&c, 0.5);
        assert_close(&exp_primary(&mut c, &half).unwrap(), 0.5f64.exp());
        let neg = Estimate::from_f64(&c, -0.75);
        assert_close(&exp_primary(&mut c, &neg).unwrap(), (-0.75f64).exp());
    }

    #[test]
    fn log_primary_values() {
        let mut c = Context::with_precision(4).unwrap();
        let two = Estimate::from_i32(&c, 2);
        assert_close(&log_primary(&mut c, &two).unwrap(), std::f64::consts::LN_2);
        let x = Estimate::from_f64(&c, 0.6);
        assert_close(&log_primary(&mut c, &x).unwrap(), 0.6f64.ln());
    }

    #[test]
    fn sin_primary_values() {
        let mut c = Context::with_precision(4).unwrap();
        for x in [0.1, -0.5, 1.0, 1.5] {
            let est = Estimate::from_f64(&c, x);
            assert_close(&sin_primary(&mut c, &est).unwrap(), x.sin());
        }
    }

    #[test]
    fn sin_primary_large_reduction() {
        // 70 words: 19 base-3 reductions, one of them by 3^19.
        let mut c = Context::with_precision(70).unwrap();
        let est = Estimate::from_f64(&c, 0.7);
        let s = sin_primary(&mut c, &est).unwrap();
        assert!((s.value().as_f64() - 0.7f64.sin()).abs() < 1e-15);
        assert!(s.error().as_f64() < 1e-300);
    }

    #[test]
    fn asin_primary_values() {
        let mut c = Context::with_precision(4).unwrap();
        let est = Estimate::from_f64(&c, 0.5);
        assert_close(&asin_primary(&mut c, &est).unwrap(), std::f64::consts::FRAC_PI_6);
    }

    #[test]
    fn primaries_cover_inexact_arguments() {
        let mut c = Context::with_precision(4).unwrap();
        let mut x = Estimate::from_f64(&c, 0.5);
        x.add_error(&Estimate::from_f64(&c, 0.45));
        let l = log_primary(&mut c, &x).unwrap();
        for end in [0.05f64, 0.95] {
            assert!((l.value().as_f64() - end.ln()).abs() <= l.error().as_f64(), "ln {end}");
        }
        let mut y = Estimate::from_f64(&c, -0.2);
        y.add_error(&Estimate::from_f64(&c, 0.5));
        let a = asin_primary(&mut c, &y).unwrap();
        for end in [-0.7f64, 0.3] {
            assert!((a.value().as_f64() - end.asin()).abs() <= a.error().as_f64(), "asin {end}");
        }
        // The centre still converges to full precision.
        assert!((a.value().as_f64() - (-0.2f64).asin()).abs() < 1e-15);
    }

    #[test]
    fn asin_spread_is_capped_near_the_ends() {
        let c = Context::with_precision(4).unwrap();
        let mut y = Estimate::from_f64(&c, 0.5);
        assert!(asin_spread(&y).is_zero());
        y.add_error(&Estimate::from_f64(&c, 0.25));
        assert_eq!(asin_spread(&y).as_f64(), 1.0);
        y.add_error(&Estimate::from_f64(&c, 0.25));
        assert_eq!(asin_spread(&y).as_f64(), 4.0);
    }

    #[test]
    fn reciprocal_pi() {
        let mut c = Context::with_precision(6).unwrap();
        let r = rpi(&mut c).unwrap();
        assert_close(&r, std::f64::consts::FRAC_1_PI);
    }

    #[test]
    fn newton_driver_reaches_target() {
        let mut c = Context::with_precision(8).unwrap();
        let arg = Estimate::from_i32(&c, 2);
        let seed = Estimate::from_f64(&c, 0.5);
        let mut steps = 0;
        // est ← est·(2 − arg·est) converges to 1/arg.
        let r = nr_iter(&mut c, arg, seed, 50, |ctx, arg, est, prec| {
            steps += 1;
            let two = Estimate::from_i32(ctx, 2);
            let corr = two.sub(&arg.mul(est, ctx), ctx);
            est.mul_assign(&corr, ctx);
            Ok(2 * prec)
        })
        .unwrap();
        assert_eq!(r.precision(), 8);
        assert_eq!(r.value().as_f64(), 0.5);
        // 50 → 100 → 200 bits, then the final step.
        assert_eq!(steps, 3);
    }
}
