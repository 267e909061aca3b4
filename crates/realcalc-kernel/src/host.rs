//! Host numeric services: leading-zero count and `f64` mantissa/exponent splitting.

/// Count leading zero bits of a word (32 for zero).
#[inline]
#[must_use]
pub fn clz(w: u32) -> u32 {
    w.leading_zeros()
}

/// Split `x` into `(m, e)` with `x = m * 2^e` and `0.5 <= |m| < 1`.
///
/// Zero, infinities and NaN are returned unchanged with exponent 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i32;
    if biased == 0 {
        // Subnormal: scale into the normal range first.
        let (m, e) = frexp(x * f64::powi(2.0, 64));
        return (m, e - 64);
    }
    let e = biased - 1022;
    let m = f64::from_bits((bits & !(0x7FF << 52)) | (1022 << 52));
    (m, e)
}

/// Compute `x * 2^e`, stepping through the exponent so intermediate values do
/// not overflow or underflow prematurely.
#[must_use]
pub fn ldexp(x: f64, e: i32) -> f64 {
    const STEP: i32 = 1000;
    let mut v = x;
    let mut e = e;
    while e > STEP {
        v *= f64::powi(2.0, STEP);
        e -= STEP;
        if v.is_infinite() {
            return v;
        }
    }
    while e < -STEP {
        v *= f64::powi(2.0, -STEP);
        e += STEP;
        if v == 0.0 {
            return v;
        }
    }
    v * f64::powi(2.0, e)
}
