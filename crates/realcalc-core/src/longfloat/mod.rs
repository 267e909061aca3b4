//! Arbitrary-precision floating value on top of the mantissa kernel.
//!
//! A [`LongFloat`] is a sign, a word exponent (power of `2^32`), a mantissa of
//! working length `n` and a [`Kind`] tag. For `Normal` values the top word
//! is nonzero and
//!
//! ```text
//! value = ±Σ m[i] · 2^(32·(exponent − n + i))
//! ```
//!
//! so `|value|` lies in `[2^(32(e−1)), 2^(32e))`. `precision` is the number of
//! top words that multiplication and division read; it never exceeds `n`.

mod arith;
mod convert;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;

use realcalc_kernel::{mantissa, Kernel, MIN_WORKING_PRECISION};

/// Special-value tag of a [`LongFloat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Normal,
    Zero,
    Infinity,
    NaN,
}

/// Multi-word floating point value.
#[derive(Debug, Clone)]
pub struct LongFloat {
    negative: bool,
    kind: Kind,
    exponent: i32,
    mantissa: Vec<u32>,
    precision: usize,
}

impl LongFloat {
    /// A special value of `words` words. `Kind::Normal` yields a zero.
    #[must_use]
    pub fn from_special(kind: Kind, negative: bool, words: usize) -> Self {
        debug_assert!(words >= MIN_WORKING_PRECISION);
        let kind = if kind == Kind::Normal { Kind::Zero } else { kind };
        Self {
            negative,
            kind,
            exponent: 0,
            mantissa: vec![0; words],
            precision: words,
        }
    }

    /// Positive zero.
    #[must_use]
    pub fn zero(words: usize) -> Self {
        Self::from_special(Kind::Zero, false, words)
    }

    /// Exact `mantissa · 2^(32·exponent)`.
    #[must_use]
    pub fn from_i32(mantissa: i32, exponent: i32, words: usize) -> Self {
        let mut lf = Self::zero(words);
        if mantissa != 0 {
            lf.kind = Kind::Normal;
            lf.negative = mantissa < 0;
            lf.exponent = exponent.saturating_add(1);
            lf.mantissa[words - 1] = mantissa.unsigned_abs();
        }
        lf
    }

    pub(crate) fn from_parts(negative: bool, exponent: i32, mantissa: Vec<u32>) -> Self {
        let precision = mantissa.len();
        let mut lf = Self {
            negative,
            kind: Kind::Normal,
            exponent,
            mantissa,
            precision,
        };
        let shift = mantissa::normalize(&mut lf.mantissa);
        if shift == lf.mantissa.len() {
            lf.set_special(Kind::Zero, negative);
        } else {
            lf.offset_exponent(-i32::try_from(shift).unwrap_or(i32::MAX));
        }
        lf
    }

    pub(crate) fn set_special(&mut self, kind: Kind, negative: bool) {
        self.kind = kind;
        self.negative = negative;
        self.exponent = 0;
        self.mantissa.fill(0);
    }

    /// Copy `src` into `self`, reusing the word buffer.
    pub(crate) fn assign(&mut self, src: &Self) {
        self.negative = src.negative;
        self.kind = src.kind;
        self.exponent = src.exponent;
        self.precision = src.precision;
        self.mantissa.clone_from(&src.mantissa);
    }

    /// Add to the word exponent, saturating. Only called where the shift is
    /// known to stay far from the `i32` limits.
    pub(crate) fn offset_exponent(&mut self, words: i32) {
        self.exponent = self.exponent.saturating_add(words);
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.kind == Kind::Zero
    }

    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.kind == Kind::Normal
    }

    /// Zero or normal.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(self.kind, Kind::Normal | Kind::Zero)
    }

    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.kind == Kind::Infinity
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.kind == Kind::NaN
    }

    /// Word exponent (meaningful for normal values only).
    #[must_use]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Mantissa words, least significant first.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.mantissa
    }

    /// Working length `n` of the mantissa.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.mantissa.len()
    }

    /// Number of significant top words.
    #[must_use]
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Set the number of significant words, clamped to `1..=n`.
    pub fn set_precision(&mut self, words: usize) {
        self.precision = words.clamp(1, self.mantissa.len());
    }

    /// Bit offset of the last trusted bit after an addition, relative to
    /// the word exponent of the result.
    #[must_use]
    pub fn rounding_error_add(&self) -> i32 {
        -word_bits(self.mantissa.len()).saturating_add(1)
    }

    /// Like [`Self::rounding_error_add`] for a product. Operands truncated to
    /// `p < n` words lose up to one unit in word `p − 1` each.
    #[must_use]
    pub fn rounding_error_mul(&self) -> i32 {
        if self.precision >= self.mantissa.len() {
            self.rounding_error_add()
        } else {
            -word_bits(self.precision - 1) + 2
        }
    }

    /// Like [`Self::rounding_error_add`] for a quotient or reciprocal.
    #[must_use]
    pub fn rounding_error_div(&self) -> i32 {
        -word_bits(self.precision.saturating_sub(1)) + 2
    }

    /// `-1`, `0` or `1` for negative, zero and positive values; NaN has none.
    fn sign_class(&self) -> Option<i8> {
        match self.kind {
            Kind::NaN => None,
            Kind::Zero => Some(0),
            _ => Some(if self.negative { -1 } else { 1 }),
        }
    }

    /// Compare absolute values of two non-NaN, nonzero values.
    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.kind, other.kind) {
            (Kind::Infinity, Kind::Infinity) => Ordering::Equal,
            (Kind::Infinity, _) => Ordering::Greater,
            (_, Kind::Infinity) => Ordering::Less,
            _ => self
                .exponent
                .cmp(&other.exponent)
                .then_with(|| mantissa::cmp(&self.mantissa, &other.mantissa)),
        }
    }
}

fn word_bits(words: usize) -> i32 {
    i32::try_from(words).unwrap_or(i32::MAX).saturating_mul(32)
}

impl PartialEq for LongFloat {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for LongFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.sign_class()?, other.sign_class()?);
        Some(match a.cmp(&b) {
            Ordering::Equal => match a {
                0 => Ordering::Equal,
                1 => self.cmp_magnitude(other),
                _ => other.cmp_magnitude(self),
            },
            ord => ord,
        })
    }
}

thread_local! {
    /// Kernel for `Display`, resized to each value it prints.
    static DISPLAY_KERNEL: RefCell<Option<Kernel>> = const { RefCell::new(None) };
}

fn with_display_kernel<R>(words: usize, f: impl FnOnce(&mut Kernel) -> R) -> Option<R> {
    DISPLAY_KERNEL.with(|cell| {
        let mut kernel = match cell.borrow_mut().take() {
            Some(k) if k.precision() == words => k,
            Some(mut k) => {
                k.initialize(words).ok()?;
                k
            }
            None => Kernel::new(words).ok()?,
        };
        let out = f(&mut kernel);
        *cell.borrow_mut() = Some(kernel);
        Some(out)
    })
}

impl fmt::Display for LongFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = with_display_kernel(self.word_count(), |k| self.as_decimal(20, k))
            .ok_or(fmt::Error)?;
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_factories() {
        let z = LongFloat::zero(3);
        assert!(z.is_zero() && z.is_finite() && !z.is_negative());
        let ni = LongFloat::from_special(Kind::Infinity, true, 4);
        assert!(ni.is_infinite() && ni.is_negative());
        assert_eq!(ni.word_count(), 4);
        assert!(LongFloat::from_special(Kind::Normal, false, 3).is_zero());
    }

    #[test]
    fn from_i32_layout() {
        let x = LongFloat::from_i32(-7, 2, 3);
        assert!(x.is_normal() && x.is_negative());
        assert_eq!(x.exponent(), 3);
        assert_eq!(x.words(), &[0, 0, 7]);
        assert!(LongFloat::from_i32(0, 5, 3).is_zero());
        let m = LongFloat::from_i32(i32::MIN, 0, 3);
        assert_eq!(m.words()[2], 0x8000_0000);
    }

    #[test]
    fn from_parts_normalizes() {
        let x = LongFloat::from_parts(false, 3, vec![5, 0, 0]);
        assert_eq!(x.words(), &[0, 0, 5]);
        assert_eq!(x.exponent(), 1);
        assert!(LongFloat::from_parts(true, 3, vec![0, 0, 0]).is_zero());
    }

    #[test]
    fn precision_is_clamped() {
        let mut x = LongFloat::from_i32(1, 0, 5);
        assert_eq!(x.precision(), 5);
        x.set_precision(9);
        assert_eq!(x.precision(), 5);
        x.set_precision(0);
        assert_eq!(x.precision(), 1);
        x.set_precision(3);
        assert_eq!(x.precision(), 3);
    }

    #[test]
    fn rounding_offsets() {
        let mut x = LongFloat::from_i32(1, 0, 4);
        assert_eq!(x.rounding_error_add(), -129);
        assert_eq!(x.rounding_error_mul(), -129);
        assert_eq!(x.rounding_error_div(), -94);
        x.set_precision(2);
        assert_eq!(x.rounding_error_mul(), -30);
        assert_eq!(x.rounding_error_div(), -30);
    }

    #[test]
    fn ordering() {
        let one = LongFloat::from_i32(1, 0, 3);
        let two = LongFloat::from_i32(2, 0, 3);
        let big = LongFloat::from_i32(1, 1, 3);
        let neg = LongFloat::from_i32(-3, 0, 3);
        let pz = LongFloat::zero(3);
        let nz = LongFloat::from_special(Kind::Zero, true, 3);
        let inf = LongFloat::from_special(Kind::Infinity, false, 3);
        let ninf = LongFloat::from_special(Kind::Infinity, true, 3);
        let nan = LongFloat::from_special(Kind::NaN, false, 3);

        assert!(one < two && two < big && big < inf);
        assert!(neg < pz && ninf < neg);
        assert!(LongFloat::from_i32(-1, 0, 3) > neg);
        assert_eq!(pz, nz);
        assert!(nan != nan.clone());
        assert_eq!(nan.partial_cmp(&one), None);
        assert_eq!(one, LongFloat::from_i32(1, 0, 3));
    }

    #[test]
    fn display_reuses_the_thread_kernel() {
        let short = LongFloat::from_f64(0.1, 3);
        let long = LongFloat::from_f64(0.1, 5);
        assert_eq!(short.to_string(), "1.0000000000000000555e-1");
        assert_eq!(long.to_string(), short.to_string());
        DISPLAY_KERNEL.with(|cell| {
            assert_eq!(cell.borrow().as_ref().map(Kernel::precision), Some(5));
        });
        assert_eq!(short.to_string(), "1.0000000000000000555e-1");
        DISPLAY_KERNEL.with(|cell| {
            assert_eq!(cell.borrow().as_ref().map(Kernel::precision), Some(3));
        });
    }
}
