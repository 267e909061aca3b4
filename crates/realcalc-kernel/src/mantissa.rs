//! Mantissa routines on fixed-length word slices.
//!
//! A mantissa is a little-endian slice of `u32` words (index 0 least
//! significant). All slices passed to one call have the same length, the
//! working precision `n`. Routines report carry, borrow or exponent
//! corrections to the caller instead of touching any exponent themselves.

use std::cmp::Ordering;

use crate::arith::{add_scalar, add_with_carry, mul_add, rounds_up, sub_with_borrow};

/// Left-pack the mantissa so its top word is nonzero.
///
/// Returns the number of words shifted out of the top. A return value equal
/// to `m.len()` means every word was zero: the value is a true zero.
pub fn normalize(m: &mut [u32]) -> usize {
    let n = m.len();
    let Some(top) = m.iter().rposition(|&w| w != 0) else {
        return n;
    };
    let shift = n - 1 - top;
    if shift > 0 {
        m.copy_within(0..=top, shift);
        m[..shift].fill(0);
    }
    shift
}

/// `dst = full + (part >> 32*start)`, rounding to nearest on the highest
/// shifted-out word of `part`.
///
/// Returns `true` on carry out of the top word.
pub fn add(dst: &mut [u32], full: &[u32], part: &[u32], start: usize) -> bool {
    let n = dst.len();
    let start = start.min(n + 1);
    let mut carry = u32::from(start != 0 && start <= n && rounds_up(part[start - 1]));
    for u in 0..n {
        let p = if u + start < n { part[u + start] } else { 0 };
        let (v, c) = add_with_carry(full[u], p, carry);
        dst[u] = v;
        carry = c;
    }
    carry != 0
}

/// `dst = full - (part >> 32*start)`, rounding the shifted-out part like [`add`].
///
/// Returns `true` when the shifted `part` exceeded `full`; `dst` then holds
/// the two's complement of the difference and must be [`negate`]d.
pub fn sub(dst: &mut [u32], full: &[u32], part: &[u32], start: usize) -> bool {
    let n = dst.len();
    let start = start.min(n + 1);
    let mut borrow = u32::from(start != 0 && start <= n && rounds_up(part[start - 1]));
    for u in 0..n {
        let p = if u + start < n { part[u + start] } else { 0 };
        let (v, b) = sub_with_borrow(full[u], p, borrow);
        dst[u] = v;
        borrow = b;
    }
    borrow != 0
}

/// Two's-complement negate in place.
pub fn negate(m: &mut [u32]) {
    let Some(first) = m.iter().position(|&w| w != 0) else {
        return;
    };
    m[first] = m[first].wrapping_neg();
    for w in &mut m[first + 1..] {
        *w = !*w;
    }
}

/// Fold a word that overflowed the top of the mantissa back in.
///
/// Shifts right by one word (rounding on the dropped word), stores `msw` at
/// the top and repeats while the rounding carry overflows it. Returns the
/// number of word shifts, to be added to the exponent.
pub fn adjust_for_carry(m: &mut [u32], msw: u32) -> i32 {
    let n = m.len();
    let mut msw = msw;
    let mut shifts = 0;
    loop {
        let mut carry = u32::from(rounds_up(m[0]));
        for u in 1..n {
            let (v, c) = add_with_carry(m[u], carry, 0);
            m[u - 1] = v;
            carry = c;
        }
        let (top, overflow) = add_with_carry(msw, carry, 0);
        m[n - 1] = top;
        shifts += 1;
        if overflow == 0 {
            return shifts;
        }
        msw = 1;
    }
}

/// Multiply by a single word in place; returns the overflow word.
pub fn scale(m: &mut [u32], k: u32) -> u32 {
    let mut carry = 0;
    for w in m.iter_mut() {
        let (lo, hi) = mul_add(*w, k, 0, carry);
        *w = lo;
        carry = hi;
    }
    carry
}

/// Shift left by `bits < 32` in place; returns the bits shifted out of the top.
#[allow(clippy::cast_possible_truncation)]
pub fn bscale(m: &mut [u32], bits: u32) -> u32 {
    debug_assert!(bits < 32);
    if bits == 0 {
        return 0;
    }
    let mut carry = 0u32;
    for w in m.iter_mut() {
        let v = (u64::from(*w) << bits) | u64::from(carry);
        *w = v as u32;
        carry = (v >> 32) as u32;
    }
    carry
}

/// Divide by a single nonzero word in place, rounding to nearest.
///
/// Returns the exponent correction: `-1` when the top word was smaller than
/// the divisor (the quotient was shifted up one word), `+1` more when
/// rounding carried out of the top word.
#[allow(clippy::cast_possible_truncation)]
pub fn inv_scale(m: &mut [u32], divisor: u32) -> i32 {
    debug_assert!(divisor != 0);
    let n = m.len();
    let d = u64::from(divisor);
    let mut e = 0;
    let mut next = n;
    let mut rem = 0u64;
    if m[n - 1] < divisor {
        rem = u64::from(m[n - 1]);
        next = n - 1;
        e = -1;
    }
    for j in (0..n).rev() {
        let low = if next > 0 {
            next -= 1;
            m[next]
        } else {
            0
        };
        let cur = (rem << 32) | u64::from(low);
        m[j] = (cur / d) as u32;
        rem = cur % d;
    }
    if 2 * rem >= d && add_scalar(m, 1) != 0 {
        m[n - 1] = 1;
        e += 1;
    }
    e
}

/// Compare two mantissas of equal length.
#[must_use]
pub fn cmp(a: &[u32], b: &[u32]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

/// Are all words zero?
#[must_use]
pub fn is_zero(m: &[u32]) -> bool {
    m.iter().all(|&w| w == 0)
}

/// Schoolbook product of two equal-length word slices into `prod` (`2*len` words).
pub(crate) fn mul_into(prod: &mut [u32], a: &[u32], b: &[u32]) {
    let len = a.len();
    prod.fill(0);
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        let mut carry = 0;
        for (j, &bj) in b.iter().enumerate() {
            let (lo, hi) = mul_add(ai, bj, prod[i + j], carry);
            prod[i + j] = lo;
            carry = hi;
        }
        prod[i + len] = carry;
    }
}

/// `r = 2*r + bit` over `r.len()` words; the top bit must be clear.
pub(crate) fn shl1_in(r: &mut [u32], bit: u32) {
    let mut carry = bit;
    for w in r.iter_mut() {
        let next = *w >> 31;
        *w = (*w << 1) | carry;
        carry = next;
    }
    debug_assert_eq!(carry, 0);
}

/// Compare `r` (one word longer) with `b`.
pub(crate) fn cmp_extended(r: &[u32], b: &[u32]) -> Ordering {
    let len = b.len();
    if r[len] != 0 {
        return Ordering::Greater;
    }
    cmp(&r[..len], b)
}

/// `r -= b` where `r` is one word longer and `r >= b`.
pub(crate) fn sub_extended(r: &mut [u32], b: &[u32]) {
    let mut borrow = 0;
    for (u, &bw) in b.iter().enumerate() {
        let (v, nb) = sub_with_borrow(r[u], bw, borrow);
        r[u] = v;
        borrow = nb;
    }
    let len = b.len();
    r[len] = r[len].wrapping_sub(borrow);
}
