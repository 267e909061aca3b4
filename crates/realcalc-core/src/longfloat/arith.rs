//! LongFloat arithmetic. Special values follow the IEEE combination rules;
//! normal operands go through the mantissa kernel.
//!
//! Every operation has an in-place `*_assign` form; the pure form clones and
//! delegates to it.

use std::mem;

use realcalc_kernel::{mantissa, Kernel};

use super::{Kind, LongFloat};
use crate::RealError;

/// Word shift between two exponents, saturated past the mantissa length.
fn word_shift(high: i32, low: i32, words: usize) -> usize {
    let diff = i64::from(high) - i64::from(low);
    usize::try_from(diff).map_or(words + 1, |d| d.min(words + 1))
}

impl LongFloat {
    /// Swap a freshly computed mantissa in and hand the old buffer back.
    fn commit(&mut self, out: Vec<u32>, kernel: &mut Kernel) {
        let old = mem::replace(&mut self.mantissa, out);
        kernel.restore_scratch(old);
    }

    pub fn neg_assign(&mut self) {
        self.negative = !self.negative;
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        let mut r = self.clone();
        r.neg_assign();
        r
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        let mut r = self.clone();
        r.negative = false;
        r
    }

    pub fn add_assign(&mut self, rhs: &Self, kernel: &mut Kernel) {
        self.add_signed(rhs, rhs.negative, kernel);
    }

    #[must_use]
    pub fn add(&self, rhs: &Self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.add_assign(rhs, kernel);
        r
    }

    pub fn sub_assign(&mut self, rhs: &Self, kernel: &mut Kernel) {
        self.add_signed(rhs, !rhs.negative, kernel);
    }

    #[must_use]
    pub fn sub(&self, rhs: &Self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.sub_assign(rhs, kernel);
        r
    }

    /// `self + rhs` where `rhs` is taken with sign `rhs_negative`.
    fn add_signed(&mut self, rhs: &Self, rhs_negative: bool, kernel: &mut Kernel) {
        match (self.kind, rhs.kind) {
            (Kind::NaN, _) => {}
            (_, Kind::NaN) => self.set_special(Kind::NaN, false),
            (Kind::Infinity, Kind::Infinity) => {
                if self.negative != rhs_negative {
                    self.set_special(Kind::NaN, false);
                }
            }
            (Kind::Infinity, _) | (_, Kind::Zero) => {
                if self.kind == Kind::Zero {
                    self.negative = self.negative && rhs_negative;
                }
            }
            (_, Kind::Infinity) => self.set_special(Kind::Infinity, rhs_negative),
            (Kind::Zero, Kind::Normal) => {
                self.assign(rhs);
                self.negative = rhs_negative;
            }
            (Kind::Normal, Kind::Normal) => {
                if self.negative == rhs_negative {
                    self.add_magnitudes(rhs, kernel);
                } else {
                    self.sub_magnitudes(rhs, kernel);
                }
                self.precision = self.precision.min(rhs.precision);
            }
        }
    }

    fn add_magnitudes(&mut self, rhs: &Self, kernel: &mut Kernel) {
        let n = self.mantissa.len();
        debug_assert_eq!(n, kernel.precision());
        let mut out = kernel.take_scratch();
        let (mut exp, carry) = if self.exponent >= rhs.exponent {
            let start = word_shift(self.exponent, rhs.exponent, n);
            let c = mantissa::add(&mut out, &self.mantissa, &rhs.mantissa, start);
            (self.exponent, c)
        } else {
            let start = word_shift(rhs.exponent, self.exponent, n);
            let c = mantissa::add(&mut out, &rhs.mantissa, &self.mantissa, start);
            (rhs.exponent, c)
        };
        if carry {
            exp = exp.saturating_add(mantissa::adjust_for_carry(&mut out, 1));
        }
        self.exponent = exp;
        self.commit(out, kernel);
    }

    fn sub_magnitudes(&mut self, rhs: &Self, kernel: &mut Kernel) {
        let n = self.mantissa.len();
        debug_assert_eq!(n, kernel.precision());
        let mut out = kernel.take_scratch();
        let (exp, borrow, mut negative) = if self.exponent >= rhs.exponent {
            let start = word_shift(self.exponent, rhs.exponent, n);
            let b = mantissa::sub(&mut out, &self.mantissa, &rhs.mantissa, start);
            (self.exponent, b, self.negative)
        } else {
            let start = word_shift(rhs.exponent, self.exponent, n);
            let b = mantissa::sub(&mut out, &rhs.mantissa, &self.mantissa, start);
            (rhs.exponent, b, !self.negative)
        };
        if borrow {
            mantissa::negate(&mut out);
            negative = !negative;
        }
        let shift = mantissa::normalize(&mut out);
        self.commit(out, kernel);
        if shift == n {
            self.set_special(Kind::Zero, false);
            return;
        }
        self.negative = negative;
        self.exponent = exp.saturating_sub(i32::try_from(shift).unwrap_or(i32::MAX));
    }

    /// Left shift by `bits` (negative shifts right). Specials are unchanged.
    pub fn shl_assign(&mut self, bits: i32) {
        if bits == 0 || self.kind != Kind::Normal {
            return;
        }
        let words = bits.div_euclid(32);
        #[allow(clippy::cast_sign_loss)]
        let rem = bits.rem_euclid(32) as u32;
        let mut exp = self.exponent.saturating_add(words);
        let carry = mantissa::bscale(&mut self.mantissa, rem);
        if carry != 0 {
            exp = exp.saturating_add(mantissa::adjust_for_carry(&mut self.mantissa, carry));
        }
        self.exponent = exp;
    }

    #[must_use]
    pub fn shl(&self, bits: i32) -> Self {
        let mut r = self.clone();
        r.shl_assign(bits);
        r
    }

    pub fn shr_assign(&mut self, bits: i32) {
        self.shl_assign(bits.saturating_neg());
    }

    #[must_use]
    pub fn shr(&self, bits: i32) -> Self {
        self.shl(bits.saturating_neg())
    }

    /// Add `words` to the word exponent of a normal value.
    pub fn add_to_exponent(&mut self, words: i32) -> Result<(), RealError> {
        if self.kind != Kind::Normal {
            return Ok(());
        }
        self.exponent = self.exponent.checked_add(words).ok_or_else(|| {
            RealError::InvalidArgument(format!(
                "exponent {} + {words} overflows a 32-bit word exponent",
                self.exponent
            ))
        })?;
        Ok(())
    }

    /// Product of the top `min(precision)` words of both operands.
    /// Returns the new mantissa and word exponent.
    fn mul_words(&self, rhs: &Self, kernel: &mut Kernel) -> (Vec<u32>, i32) {
        let n = self.mantissa.len();
        debug_assert_eq!(n, kernel.precision());
        let p = self.precision.min(rhs.precision);
        let mut out = kernel.take_scratch();
        let msw = kernel.mul(&mut out, &self.mantissa, &rhs.mantissa, n - p, p);
        let mut exp = self
            .exponent
            .saturating_add(rhs.exponent)
            .saturating_sub(1);
        if msw != 0 {
            exp = exp.saturating_add(mantissa::adjust_for_carry(&mut out, msw));
        }
        debug_assert_ne!(out[n - 1], 0);
        (out, exp)
    }

    /// Special-value table shared by multiplication and division.
    /// Returns `true` when the result is already settled.
    fn mul_special(&mut self, rhs: &Self, div: bool) -> bool {
        let negative = self.negative != rhs.negative;
        let kind = match (self.kind, rhs.kind) {
            (Kind::Normal, Kind::Normal) => return false,
            (Kind::NaN, _) | (_, Kind::NaN) => Kind::NaN,
            (Kind::Zero, Kind::Infinity) | (Kind::Infinity, Kind::Zero) if !div => Kind::NaN,
            (Kind::Zero, Kind::Zero) | (Kind::Infinity, Kind::Infinity) if div => Kind::NaN,
            (Kind::Infinity, _) => Kind::Infinity,
            (Kind::Zero, _) => Kind::Zero,
            (_, Kind::Infinity) => {
                if div {
                    Kind::Zero
                } else {
                    Kind::Infinity
                }
            }
            (_, Kind::Zero) => {
                if div {
                    Kind::Infinity
                } else {
                    Kind::Zero
                }
            }
        };
        self.set_special(kind, negative && kind != Kind::NaN);
        true
    }

    pub fn mul_assign(&mut self, rhs: &Self, kernel: &mut Kernel) {
        if self.mul_special(rhs, false) {
            return;
        }
        let (out, exp) = self.mul_words(rhs, kernel);
        self.commit(out, kernel);
        self.exponent = exp;
        self.negative = self.negative != rhs.negative;
        self.precision = self.precision.min(rhs.precision);
    }

    #[must_use]
    pub fn mul(&self, rhs: &Self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.mul_assign(rhs, kernel);
        r
    }

    pub fn sq_assign(&mut self, kernel: &mut Kernel) {
        match self.kind {
            Kind::Normal => {
                let (out, exp) = self.mul_words(self, kernel);
                self.commit(out, kernel);
                self.exponent = exp;
                self.negative = false;
            }
            Kind::NaN => {}
            _ => self.negative = false,
        }
    }

    #[must_use]
    pub fn sq(&self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.sq_assign(kernel);
        r
    }

    /// Multiply by a machine integer.
    pub fn mul_i32_assign(&mut self, k: i32) {
        let negative = self.negative != (k < 0);
        match self.kind {
            Kind::NaN => return,
            Kind::Infinity if k == 0 => return self.set_special(Kind::NaN, false),
            Kind::Infinity | Kind::Zero => {
                self.negative = negative;
                return;
            }
            Kind::Normal if k == 0 => return self.set_special(Kind::Zero, negative),
            Kind::Normal => {}
        }
        self.negative = negative;
        let carry = mantissa::scale(&mut self.mantissa, k.unsigned_abs());
        if carry != 0 {
            let adj = mantissa::adjust_for_carry(&mut self.mantissa, carry);
            self.offset_exponent(adj);
        }
    }

    #[must_use]
    pub fn mul_i32(&self, k: i32) -> Self {
        let mut r = self.clone();
        r.mul_i32_assign(k);
        r
    }

    /// Divide by a machine integer. `x / 0` is a signed infinity and `0 / 0`
    /// is NaN.
    pub fn div_i32_assign(&mut self, k: i32) {
        let negative = self.negative != (k < 0);
        match self.kind {
            Kind::NaN => return,
            Kind::Zero if k == 0 => return self.set_special(Kind::NaN, false),
            Kind::Infinity | Kind::Zero => {
                self.negative = negative;
                return;
            }
            Kind::Normal if k == 0 => return self.set_special(Kind::Infinity, self.negative),
            Kind::Normal => {}
        }
        self.negative = negative;
        let adj = mantissa::inv_scale(&mut self.mantissa, k.unsigned_abs());
        self.offset_exponent(adj);
    }

    #[must_use]
    pub fn div_i32(&self, k: i32) -> Self {
        let mut r = self.clone();
        r.div_i32_assign(k);
        r
    }

    /// `self += a · b`.
    pub fn fma_assign(&mut self, a: &Self, b: &Self, kernel: &mut Kernel) {
        let prod = a.mul(b, kernel);
        self.add_assign(&prod, kernel);
    }

    #[must_use]
    pub fn fma(&self, a: &Self, b: &Self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.fma_assign(a, b, kernel);
        r
    }

    /// `self += a · k`.
    pub fn fma_i32_assign(&mut self, a: &Self, k: i32, kernel: &mut Kernel) {
        self.add_assign(&a.mul_i32(k), kernel);
    }

    #[must_use]
    pub fn fma_i32(&self, a: &Self, k: i32, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.fma_i32_assign(a, k, kernel);
        r
    }

    /// Integer power by repeated squaring; negative powers take the
    /// reciprocal of the result.
    pub fn pow_assign(&mut self, power: i32, kernel: &mut Kernel) {
        let mut acc = Self::from_i32(1, 0, self.mantissa.len());
        let mut base = self.clone();
        let mut left = power.unsigned_abs();
        while left != 0 {
            if left & 1 != 0 {
                acc.mul_assign(&base, kernel);
            }
            left >>= 1;
            if left != 0 {
                base.sq_assign(kernel);
            }
        }
        if power < 0 {
            acc.recip_assign(kernel);
        }
        *self = acc;
    }

    #[must_use]
    pub fn pow(&self, power: i32, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.pow_assign(power, kernel);
        r
    }

    /// `1 / self`. Above the convolution threshold this is a Newton
    /// iteration seeded from `f64`; below it a single kernel division.
    pub fn recip_assign(&mut self, kernel: &mut Kernel) {
        match self.kind {
            Kind::NaN => return,
            Kind::Zero => return self.set_special(Kind::Infinity, self.negative),
            Kind::Infinity => return self.set_special(Kind::Zero, self.negative),
            Kind::Normal => {}
        }
        let n = self.mantissa.len();
        let p = self.precision;
        if kernel.uses_convolution(p) {
            let r = self.recip_newton(kernel);
            let exp = self.exponent;
            self.assign(&r);
            self.exponent = r.exponent.saturating_sub(exp);
            self.precision = p;
            return;
        }
        let mut out = kernel.take_scratch();
        let e = kernel.recip(&mut out, &self.mantissa, n - p, p);
        self.commit(out, kernel);
        self.exponent = 1i32.saturating_add(e).saturating_sub(self.exponent);
    }

    /// Reciprocal of the mantissa alone (as a value in `[2^-32, 1)`), with
    /// the sign of `self`.
    ///
    /// Each step `r ← r·(2 − r·m)` doubles the number of correct bits, so the
    /// working window only grows as far as the current step needs.
    fn recip_newton(&self, kernel: &mut Kernel) -> Self {
        let n = self.mantissa.len();
        let p = self.precision;
        let seed = 1.0 / self.mantissa_as_f64();
        let mut r = Self::from_f64(seed, n);
        let mut neg_m = self.clone();
        neg_m.exponent = 0;
        neg_m.negative = true;
        let two = Self::from_i32(2, 0, n);
        let mut bits = 52usize;
        while bits / 32 < p {
            let window = (bits + 32) / 16;
            r.set_precision(window);
            neg_m.set_precision(window);
            let corr = two.fma(&r, &neg_m, kernel);
            r.mul_assign(&corr, kernel);
            bits *= 2;
        }
        r.negative = self.negative;
        r
    }

    #[must_use]
    pub fn recip(&self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.recip_assign(kernel);
        r
    }

    /// Division. Goes through [`Self::recip`] when the operands are special
    /// or long enough for convolution, otherwise one kernel division.
    pub fn div_assign(&mut self, rhs: &Self, kernel: &mut Kernel) {
        if self.kind != Kind::Normal
            || rhs.kind != Kind::Normal
            || kernel.uses_convolution(self.precision)
        {
            if !self.mul_special(rhs, true) {
                let r = rhs.recip(kernel);
                self.mul_assign(&r, kernel);
            }
            return;
        }
        let n = self.mantissa.len();
        let p = self.precision.min(rhs.precision);
        let mut out = kernel.take_scratch();
        let e = kernel.div(&mut out, &self.mantissa, &rhs.mantissa, n - p, p);
        self.commit(out, kernel);
        self.exponent = self
            .exponent
            .saturating_sub(rhs.exponent)
            .saturating_add(e);
        self.negative = self.negative != rhs.negative;
        self.precision = p;
    }

    #[must_use]
    pub fn div(&self, rhs: &Self, kernel: &mut Kernel) -> Self {
        let mut r = self.clone();
        r.div_assign(rhs, kernel);
        r
    }
}
