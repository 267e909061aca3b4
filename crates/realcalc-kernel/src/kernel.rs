//! Kernel: working precision plus the scratch buffers used by multiplication
//! and division.
//!
//! A [`Kernel`] is not reentrant. Every operation that touches scratch space
//! takes `&mut self`, so two operations can never interleave on one kernel;
//! threads each build their own or share one behind a lock.

use tracing::debug;

use crate::arith::{add_scalar, rounds_up};
use crate::constants::{
    convolution_size, DEFAULT_CONVOLUTION_THRESHOLD, LIMB_BITS, MIN_WORKING_PRECISION,
};
use crate::convolution::Convolution;
use crate::mantissa::{cmp_extended, mul_into, shl1_in, sub_extended};
use crate::KernelError;

/// Mantissa arithmetic at a fixed working precision.
#[derive(Debug, Clone)]
pub struct Kernel {
    precision: usize,
    threshold: usize,
    conv: Option<Convolution>,
    bufa: Vec<f64>,
    bufb: Vec<f64>,
    /// Full double-length product.
    product: Vec<u32>,
    /// Division remainder, one word longer than the operands.
    rem: Vec<u32>,
    /// Division quotient, one word longer than the operands.
    quot: Vec<u32>,
    /// Spare mantissa handed out by [`Kernel::take_scratch`].
    scratch: Vec<u32>,
}

impl Kernel {
    /// Create a kernel with the default convolution threshold.
    pub fn new(precision: usize) -> Result<Self, KernelError> {
        Self::with_threshold(precision, DEFAULT_CONVOLUTION_THRESHOLD)
    }

    /// Create a kernel that multiplies operands of `threshold` words or more by
    /// convolution. A zero threshold selects the default.
    pub fn with_threshold(precision: usize, threshold: usize) -> Result<Self, KernelError> {
        let threshold = if threshold == 0 {
            DEFAULT_CONVOLUTION_THRESHOLD
        } else {
            threshold
        };
        let mut kernel = Self {
            precision: 0,
            threshold,
            conv: None,
            bufa: Vec::new(),
            bufb: Vec::new(),
            product: Vec::new(),
            rem: Vec::new(),
            quot: Vec::new(),
            scratch: Vec::new(),
        };
        kernel.initialize(precision)?;
        Ok(kernel)
    }

    /// Resize every buffer for a new working precision.
    pub fn initialize(&mut self, precision: usize) -> Result<(), KernelError> {
        if precision < MIN_WORKING_PRECISION {
            return Err(KernelError::InvalidPrecision(precision));
        }
        self.conv = if precision >= self.threshold {
            let size = convolution_size(precision);
            self.bufa = vec![0.0; size];
            self.bufb = vec![0.0; size];
            Some(Convolution::new(size)?)
        } else {
            self.bufa = Vec::new();
            self.bufb = Vec::new();
            None
        };
        self.precision = precision;
        self.product = vec![0; 2 * precision];
        self.rem = vec![0; precision + 1];
        self.quot = vec![0; precision + 1];
        self.scratch = vec![0; precision];
        debug!(
            precision,
            threshold = self.threshold,
            convolution_size = self.conv.as_ref().map_or(0, Convolution::size),
            "kernel initialized"
        );
        Ok(())
    }

    /// Release all buffers. The kernel must be re-initialized before use.
    pub fn finalize(&mut self) {
        self.precision = 0;
        self.conv = None;
        self.bufa = Vec::new();
        self.bufb = Vec::new();
        self.product = Vec::new();
        self.rem = Vec::new();
        self.quot = Vec::new();
        self.scratch = Vec::new();
        debug!("kernel finalized");
    }

    /// Working precision in words (0 after [`Kernel::finalize`]).
    #[must_use]
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Is the kernel ready for arithmetic?
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.precision != 0
    }

    /// Operand length at which multiplication switches to convolution.
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Would a product of `len`-word windows go through the convolution engine?
    #[must_use]
    pub fn uses_convolution(&self, len: usize) -> bool {
        len >= self.threshold && self.conv.is_some()
    }

    /// Borrow the spare output mantissa. Contents are unspecified.
    ///
    /// Hand a buffer of the same length back with [`Kernel::restore_scratch`]
    /// so the next caller does not allocate.
    pub fn take_scratch(&mut self) -> Vec<u32> {
        let buf = std::mem::take(&mut self.scratch);
        if buf.len() == self.precision {
            buf
        } else {
            vec![0; self.precision]
        }
    }

    /// Return a working-length buffer to the kernel.
    pub fn restore_scratch(&mut self, buf: Vec<u32>) {
        if buf.len() == self.precision {
            self.scratch = buf;
        }
    }

    /// Schoolbook product of the windows `a[start..start+len]` and
    /// `b[start..start+len]`.
    ///
    /// The top `n` words below the most significant product word go to
    /// `dst`, rounded to nearest on the next word; the most significant word
    /// is returned so the caller can fold it in with
    /// [`crate::mantissa::adjust_for_carry`].
    pub fn mul_direct(&mut self, dst: &mut [u32], a: &[u32], b: &[u32], start: usize, len: usize) -> u32 {
        let prod = &mut self.product[..2 * len];
        mul_into(prod, &a[start..start + len], &b[start..start + len]);
        write_product(dst, prod)
    }

    /// Product of two windows; uses convolution at or above the threshold.
    ///
    /// Same contract as [`Kernel::mul_direct`].
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn mul(&mut self, dst: &mut [u32], a: &[u32], b: &[u32], start: usize, len: usize) -> u32 {
        if !self.uses_convolution(len) {
            return self.mul_direct(dst, a, b, start, len);
        }
        let Some(conv) = &self.conv else {
            return self.mul_direct(dst, a, b, start, len);
        };
        let size = convolution_size(len);
        let limb_mask = (1u32 << LIMB_BITS) - 1;
        for (buf, src) in [(&mut self.bufa, a), (&mut self.bufb, b)] {
            let buf = &mut buf[..size];
            buf.fill(0.0);
            for (i, &w) in src[start..start + len].iter().enumerate() {
                buf[2 * i] = f64::from(w & limb_mask);
                buf[2 * i + 1] = f64::from(w >> LIMB_BITS);
            }
        }
        conv.convolve_sized(&mut self.bufa, &mut self.bufb, size);

        // Back to 16-bit limbs with carry, two limbs per word.
        let prod = &mut self.product[..2 * len];
        let mut carry = 0u64;
        for (w, word) in prod.iter_mut().enumerate() {
            let mut limbs = [0u32; 2];
            for (h, limb) in limbs.iter_mut().enumerate() {
                let t = self.bufa[2 * w + h].round().max(0.0) as u64 + carry;
                *limb = (t & u64::from(limb_mask)) as u32;
                carry = t >> LIMB_BITS;
            }
            *word = limbs[0] | (limbs[1] << LIMB_BITS);
        }
        debug_assert_eq!(carry, 0);
        write_product(dst, prod)
    }

    /// Restoring division of the windows `a[start..start+len]` by
    /// `b[start..start+len]`, both with nonzero top words.
    ///
    /// Writes a `len`-word quotient rounded to nearest into
    /// `dst[start..start+len]` and zeroes the words below. Returns the
    /// exponent correction: the quotient of the windows, in words, is
    /// `dst * 2^(32*(e - len))`.
    pub fn div(&mut self, dst: &mut [u32], a: &[u32], b: &[u32], start: usize, len: usize) -> i32 {
        let a = &a[start..start + len];
        let r = &mut self.rem[..=len];
        r.fill(0);
        // The top len-1 words of `a` are below `b`, so they seed the remainder.
        r[..len - 1].copy_from_slice(&a[1..]);
        self.divide_seeded(dst, a[0], b, start, len)
    }

    /// [`Kernel::div`] with a dividend of one unit in the top word, without
    /// materializing it.
    pub fn recip(&mut self, dst: &mut [u32], b: &[u32], start: usize, len: usize) -> i32 {
        let r = &mut self.rem[..=len];
        r.fill(0);
        let low = if len == 1 {
            1
        } else {
            r[len - 2] = 1;
            0
        };
        self.divide_seeded(dst, low, b, start, len)
    }

    /// Long division once the remainder holds the dividend's top `len - 1`
    /// words; `low` is the dividend's lowest window word.
    fn divide_seeded(&mut self, dst: &mut [u32], low: u32, b: &[u32], start: usize, len: usize) -> i32 {
        let b = &b[start..start + len];
        let r = &mut self.rem[..=len];
        let q = &mut self.quot[..=len];
        q.fill(0);

        let total_bits = 32 * (len + 1);
        for pos in (0..total_bits).rev() {
            let bit = if pos >= 32 * len {
                (low >> (pos - 32 * len)) & 1
            } else {
                0
            };
            shl1_in(r, bit);
            if cmp_extended(r, b).is_ge() {
                sub_extended(r, b);
                q[pos / 32] |= 1 << (pos % 32);
            }
        }

        let (mut e, round) = if q[len] != 0 {
            // The dropped word's top bit decides rounding.
            let dropped = q[0];
            q.copy_within(1..=len, 0);
            (1, rounds_up(dropped))
        } else {
            shl1_in(r, 0);
            (0, cmp_extended(r, b).is_ge())
        };
        let out = &mut dst[start..start + len];
        out.copy_from_slice(&q[..len]);
        if round && add_scalar(out, 1) != 0 {
            out[len - 1] = 1;
            e += 1;
        }
        dst[..start].fill(0);
        e
    }
}

/// Copy the top of a double-length product into `dst`, rounding on the next
/// word, and return the most significant product word.
fn write_product(dst: &mut [u32], prod: &[u32]) -> u32 {
    let n = dst.len();
    let top = prod.len() - 1;
    for i in 0..n {
        dst[n - 1 - i] = if i < top { prod[top - 1 - i] } else { 0 };
    }
    let mut msw = prod[top];
    if n < top && rounds_up(prod[top - 1 - n]) && add_scalar(dst, 1) != 0 {
        msw = msw.wrapping_add(1);
    }
    msw
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn to_big(words: &[u32]) -> BigUint {
        BigUint::from_slice(words)
    }

    #[test]
    fn rejects_small_precision() {
        assert_eq!(
            Kernel::new(2).unwrap_err(),
            KernelError::InvalidPrecision(2)
        );
    }

    #[test]
    fn initialize_and_finalize() {
        let mut k = Kernel::new(4).unwrap();
        assert_eq!(k.precision(), 4);
        assert!(k.is_initialized());
        assert!(!k.uses_convolution(4));
        k.finalize();
        assert!(!k.is_initialized());
        k.initialize(80).unwrap();
        assert!(k.uses_convolution(60));
        assert!(!k.uses_convolution(59));
    }

    #[test]
    fn zero_threshold_means_default() {
        let k = Kernel::with_threshold(3, 0).unwrap();
        assert_eq!(k.threshold(), DEFAULT_CONVOLUTION_THRESHOLD);
    }

    #[test]
    fn scratch_round_trip() {
        let mut k = Kernel::new(5).unwrap();
        let s = k.take_scratch();
        assert_eq!(s.len(), 5);
        let t = k.take_scratch();
        assert_eq!(t.len(), 5);
        k.restore_scratch(s);
        k.restore_scratch(vec![0; 2]);
        assert_eq!(k.take_scratch().len(), 5);
    }

    #[test]
    fn mul_direct_small() {
        let mut k = Kernel::new(3).unwrap();
        let a = [0, 0, 2];
        let b = [0, 0, 3];
        let mut dst = [0u32; 3];
        let msw = k.mul_direct(&mut dst, &a, &b, 0, 3);
        // (2 * 2^64) * (3 * 2^64) = 6 * 2^128: word 4 of a 6-word product.
        assert_eq!(msw, 0);
        assert_eq!(dst, [0, 0, 6]);
    }

    #[test]
    fn mul_direct_rounds_on_next_word() {
        let mut k = Kernel::new(3).unwrap();
        // a = 2^95 + 2^64, b = 2^95 + 1 -> several nonzero low words
        let a = [0, 0, 0x8000_0001];
        let b = [1, 0, 0x8000_0000];
        let mut dst = [0u32; 3];
        let msw = k.mul_direct(&mut dst, &a, &b, 0, 3);
        let exact = to_big(&a) * to_big(&b);
        let top = exact >> 64u32;
        let got = (BigUint::from(msw) << 96u32) + to_big(&dst);
        let diff = if got > top { &got - &top } else { &top - &got };
        assert!(diff <= BigUint::from(1u32));
    }

    #[test]
    fn mul_direct_window() {
        let mut k = Kernel::new(4).unwrap();
        let a = [0xFFFF, 0, 5, 7];
        let b = [0xAAAA, 0, 3, 9];
        let mut dst = [0u32; 4];
        let msw = k.mul_direct(&mut dst, &a, &b, 2, 2);
        // [5, 7] * [3, 9] = 15 + (5*9 + 7*3) * 2^32 + 63 * 2^64
        assert_eq!(msw, 0);
        assert_eq!(dst, [0, 15, 66, 63]);
    }

    #[test]
    fn convolution_matches_direct() {
        let n = 64;
        let mut k = Kernel::with_threshold(n, 8).unwrap();
        let a: Vec<u32> = (0..n as u32).map(|i| i.wrapping_mul(2_654_435_761) | 1).collect();
        let b: Vec<u32> = (0..n as u32).map(|i| i.wrapping_mul(40_503) ^ 0xDEAD_BEEF).collect();
        for len in [8, 16, 33, 64] {
            let start = n - len;
            let mut d1 = vec![0u32; n];
            let mut d2 = vec![0u32; n];
            let m1 = k.mul_direct(&mut d1, &a, &b, start, len);
            let m2 = k.mul(&mut d2, &a, &b, start, len);
            assert_eq!(m1, m2, "msw at len {len}");
            assert_eq!(d1, d2, "words at len {len}");
        }
    }

    #[test]
    fn div_exact_quotient() {
        let mut k = Kernel::new(3).unwrap();
        let a = [0, 0, 6];
        let b = [0, 0, 3];
        let mut dst = [0u32; 3];
        let e = k.div(&mut dst, &a, &b, 0, 3);
        // 6/3 = 2 -> quotient word at the top, no shift
        assert_eq!(e, 1);
        assert_eq!(dst, [0, 0, 2]);
    }

    #[test]
    fn div_quotient_below_one() {
        let mut k = Kernel::new(3).unwrap();
        let a = [0, 0, 1];
        let b = [0, 0, 2];
        let mut dst = [0u32; 3];
        let e = k.div(&mut dst, &a, &b, 0, 3);
        // 1/2 = 0x8000_0000 * 2^-32
        assert_eq!(e, 0);
        assert_eq!(dst, [0, 0, 0x8000_0000]);
    }

    #[test]
    fn div_matches_biguint() {
        let mut k = Kernel::new(5).unwrap();
        let a = [0x1234_5678, 0x9ABC_DEF0, 0x0FED_CBA9, 0x8765_4321, 0x0000_0007];
        let b = [0xFFFF_0001, 0x0000_FFFF, 0x1111_1111, 0x2222_2222, 0x0000_0003];
        let mut dst = [0u32; 5];
        let e = k.div(&mut dst, &a, &b, 0, 5);
        assert_eq!(e, 1);
        // quotient * 2^(32*(len - e)) approximates a/b
        let scaled = (to_big(&a) << (32 * 4)) / to_big(&b);
        let got = to_big(&dst);
        let diff = if got > scaled { &got - &scaled } else { &scaled - &got };
        assert!(diff <= BigUint::from(1u32));
    }

    #[test]
    fn div_window_zeroes_low_words() {
        let mut k = Kernel::new(4).unwrap();
        let a = [9, 9, 0, 1];
        let b = [9, 9, 0, 3];
        let mut dst = [7u32; 4];
        let e = k.div(&mut dst, &a, &b, 2, 2);
        assert_eq!(e, 0);
        assert_eq!(dst[0], 0);
        assert_eq!(dst[1], 0);
        // 1/3 ~ 0x5555_5555_5555_5555 (2 words)
        assert_eq!(dst[3], 0x5555_5555);
        assert_eq!(dst[2], 0x5555_5555);
    }

    #[test]
    fn recip_matches_division_of_one() {
        let mut k = Kernel::new(4).unwrap();
        let one = [0, 0, 0, 1];
        let b = [0x1357_9BDF, 0x2468_ACE0, 0xDEAD_BEEF, 0x0000_0007];
        for (start, len) in [(0, 4), (1, 3), (3, 1)] {
            let mut by_div = [0u32; 4];
            let mut by_recip = [5u32; 4];
            let e1 = k.div(&mut by_div, &one, &b, start, len);
            let e2 = k.recip(&mut by_recip, &b, start, len);
            assert_eq!(e1, e2, "exponent at len {len}");
            assert_eq!(by_div, by_recip, "words at len {len}");
        }
    }

    #[test]
    fn div_rounding_carries_into_top_word() {
        let mut k = Kernel::new(3).unwrap();
        // a/b = 2 - 2^-95: the dropped word rounds the mantissa up
        let a = [u32::MAX, u32::MAX, u32::MAX];
        let b = [0, 0, 0x8000_0000];
        let mut dst = [0u32; 3];
        let e = k.div(&mut dst, &a, &b, 0, 3);
        assert_eq!(e, 1);
        assert_eq!(dst, [0, 0, 2]);
    }
}
