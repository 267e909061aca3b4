//! Compact error magnitudes.
//!
//! An [`ErrorEstimate`] is a 32-bit mantissa with its top bit set and a bit
//! exponent: `value = mantissa · 2^(exponent − 32)`. Every operation rounds
//! so that bounds never shrink: results round up, except [`ErrorEstimate::sub`]
//! which rounds the difference down by rounding the subtrahend up.
//!
//! Intermediate values are exact `u128` integers scaled by a power of two.

use realcalc_kernel::host;

use crate::longfloat::{Kind, LongFloat};

/// Exponent of the zero error.
pub const MINUS_INF: i32 = -0x7FFF_FFFF;
/// Exponent of the unbounded error.
pub const PLUS_INF: i32 = 0x7FFF_FFFF;

const TOP_BIT: u32 = 0x8000_0000;

/// Direction for conversions that cannot be exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Up,
    Down,
}

/// Non-negative error bound. Ordered by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorEstimate {
    // Field order gives the derived ordering: exponent first.
    exponent: i32,
    mantissa: u32,
}

impl Default for ErrorEstimate {
    fn default() -> Self {
        Self::ZERO
    }
}

impl ErrorEstimate {
    pub const ZERO: Self = Self {
        exponent: MINUS_INF,
        mantissa: 0,
    };

    pub const INFINITE: Self = Self {
        exponent: PLUS_INF,
        mantissa: TOP_BIT,
    };

    /// Smallest positive bound, the result of rounding any underflow up.
    pub const MIN_POSITIVE: Self = Self {
        exponent: MINUS_INF + 1,
        mantissa: TOP_BIT,
    };

    /// `mantissa · 2^(exponent − 32)`. The mantissa must have its top bit set
    /// and the exponent must lie strictly between the sentinels.
    #[must_use]
    pub fn new(mantissa: u32, exponent: i32) -> Self {
        debug_assert!(mantissa & TOP_BIT != 0);
        debug_assert!(exponent > MINUS_INF && exponent < PLUS_INF);
        Self { exponent, mantissa }
    }

    #[must_use]
    pub fn mantissa(self) -> u32 {
        self.mantissa
    }

    #[must_use]
    pub fn exponent(self) -> i32 {
        self.exponent
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.exponent == MINUS_INF
    }

    #[must_use]
    pub fn is_infinite(self) -> bool {
        self.exponent == PLUS_INF
    }

    /// `v · 2^unit`, rounded to a 32-bit mantissa in the given direction.
    #[allow(clippy::cast_possible_truncation)]
    fn from_u128(v: u128, unit: i64, mode: RoundingMode) -> Self {
        if v == 0 {
            return Self::ZERO;
        }
        let mut len = i64::from(128 - v.leading_zeros());
        let mut m = if len > 32 {
            let shift = (len - 32) as u32;
            let kept = v >> shift;
            let sticky = v & ((1u128 << shift) - 1) != 0;
            if sticky && mode == RoundingMode::Up {
                kept + 1
            } else {
                kept
            }
        } else {
            v << (32 - len)
        };
        if m >> 32 != 0 {
            m >>= 1;
            len += 1;
        }
        let exponent = unit + len;
        if exponent >= i64::from(PLUS_INF) {
            return Self::INFINITE;
        }
        if exponent <= i64::from(MINUS_INF) {
            return match mode {
                RoundingMode::Up => Self::MIN_POSITIVE,
                RoundingMode::Down => Self::ZERO,
            };
        }
        Self {
            exponent: exponent as i32,
            mantissa: m as u32,
        }
    }

    /// Upper bound of `|x|`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(x: f64) -> Self {
        let x = x.abs();
        if !x.is_finite() {
            return Self::INFINITE;
        }
        if x == 0.0 {
            return Self::ZERO;
        }
        let (m, e) = host::frexp(x);
        // 53 significant bits: m · 2^64 is an exact integer.
        let v = (m * 18_446_744_073_709_551_616.0) as u128;
        Self::from_u128(v, i64::from(e) - 64, RoundingMode::Up)
    }

    /// Bound on `|lf|` from its top three words; lower words count as a
    /// sticky bit when rounding up.
    #[must_use]
    pub fn from_longfloat(lf: &LongFloat, mode: RoundingMode) -> Self {
        match lf.kind() {
            Kind::Zero => return Self::ZERO,
            Kind::Infinity | Kind::NaN => return Self::INFINITE,
            Kind::Normal => {}
        }
        let words = lf.words();
        let n = words.len();
        let v = words[n - 3..]
            .iter()
            .rev()
            .fold(0u128, |acc, &w| (acc << 32) | u128::from(w));
        let sticky = words[..n - 3].iter().any(|&w| w != 0);
        let v = if sticky && mode == RoundingMode::Up {
            v + 1
        } else {
            v
        };
        Self::from_u128(v, 32 * i64::from(lf.exponent()) - 96, mode)
    }

    /// The magnitude of one unit at bit `32·exponent(lf) + re`: the rounding
    /// error of an operation whose result is `lf`.
    #[must_use]
    pub fn rounding_error(lf: &LongFloat, re: i32) -> Self {
        match lf.kind() {
            Kind::Zero => Self::ZERO,
            Kind::Infinity | Kind::NaN => Self::INFINITE,
            Kind::Normal => Self::rounding_error_at(lf.exponent(), re),
        }
    }

    /// `2^(32·exp_words + re)`.
    #[must_use]
    pub fn rounding_error_at(exp_words: i32, re: i32) -> Self {
        let bits = 32 * i64::from(exp_words) + i64::from(re);
        Self::from_u128(1, bits, RoundingMode::Up)
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        if self.is_infinite() {
            return f64::INFINITY;
        }
        host::ldexp(f64::from(self.mantissa), self.exponent.saturating_sub(32))
    }

    /// Exact LongFloat of `words` words.
    #[must_use]
    pub fn as_longfloat(self, words: usize) -> LongFloat {
        if self.is_zero() {
            return LongFloat::zero(words);
        }
        if self.is_infinite() {
            return LongFloat::from_special(Kind::Infinity, false, words);
        }
        let q = self.exponent.div_euclid(32);
        let r = self.exponent.rem_euclid(32);
        // m · 2^(e−32) = (m · 2^r) · 2^(32·(q−1)); m · 2^r fits an f64 exactly.
        let mut lf = LongFloat::from_f64(host::ldexp(f64::from(self.mantissa), r), words);
        lf.offset_exponent(q - 1);
        lf
    }

    #[must_use]
    pub fn add(self, rhs: Self) -> Self {
        if self.is_infinite() || rhs.is_infinite() {
            return Self::INFINITE;
        }
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (hi, lo) = if self >= rhs { (self, rhs) } else { (rhs, self) };
        let shift = i64::from(hi.exponent) - i64::from(lo.exponent);
        let v = (u128::from(hi.mantissa) << 64) + shifted_ceil(lo.mantissa, shift);
        Self::from_u128(v, i64::from(hi.exponent) - 96, RoundingMode::Up)
    }

    /// `self − rhs` rounded down. `self ≥ rhs` is required; in release
    /// builds a violation yields zero.
    #[must_use]
    pub fn sub(self, rhs: Self) -> Self {
        debug_assert!(self >= rhs, "error subtraction would go negative");
        self.checked_sub(rhs).unwrap_or(Self::ZERO)
    }

    /// `self − rhs` rounded down, or `None` when `rhs > self`.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        if self < rhs {
            return None;
        }
        if rhs.is_zero() {
            return Some(self);
        }
        if self.is_infinite() {
            return Some(if rhs.is_infinite() {
                Self::ZERO
            } else {
                Self::INFINITE
            });
        }
        let shift = i64::from(self.exponent) - i64::from(rhs.exponent);
        let v = (u128::from(self.mantissa) << 64) - shifted_ceil(rhs.mantissa, shift);
        Some(Self::from_u128(
            v,
            i64::from(self.exponent) - 96,
            RoundingMode::Down,
        ))
    }

    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        if self.is_infinite() || rhs.is_infinite() {
            return Self::INFINITE;
        }
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        let v = u128::from(self.mantissa) * u128::from(rhs.mantissa);
        let unit = i64::from(self.exponent) + i64::from(rhs.exponent) - 64;
        Self::from_u128(v, unit, RoundingMode::Up)
    }

    #[must_use]
    pub fn recip(self) -> Self {
        if self.is_zero() {
            return Self::INFINITE;
        }
        if self.is_infinite() {
            return Self::ZERO;
        }
        // 1/(m·2^(e−32)) = (2^96/m) · 2^(−64−e)
        let v = (1u128 << 96).div_ceil(u128::from(self.mantissa));
        Self::from_u128(v, -64 - i64::from(self.exponent), RoundingMode::Up)
    }

    #[must_use]
    pub fn div(self, rhs: Self) -> Self {
        self.mul(rhs.recip())
    }

    /// Next representable bound above `self`.
    #[must_use]
    pub fn inc(self) -> Self {
        if self.is_infinite() {
            return self;
        }
        if self.is_zero() {
            return Self::MIN_POSITIVE;
        }
        match self.mantissa.checked_add(1) {
            Some(m) => Self {
                exponent: self.exponent,
                mantissa: m,
            },
            None => Self::from_u128(1, i64::from(self.exponent), RoundingMode::Up),
        }
    }

    /// `self · 2^bits`, saturating to the sentinels.
    #[must_use]
    pub fn shl(self, bits: i32) -> Self {
        if self.is_zero() || self.is_infinite() {
            return self;
        }
        Self::from_u128(
            u128::from(self.mantissa),
            i64::from(self.exponent) - 32 + i64::from(bits),
            RoundingMode::Up,
        )
    }
}

/// `(m << 64) >> shift`, rounded up when bits are shifted out.
fn shifted_ceil(m: u32, shift: i64) -> u128 {
    if shift >= 96 {
        return 1;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shift = shift as u32;
    let wide = u128::from(m) << 64;
    let kept = wide >> shift;
    if shift > 0 && wide & ((1u128 << shift) - 1) != 0 {
        kept + 1
    } else {
        kept
    }
}
