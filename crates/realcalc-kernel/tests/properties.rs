//! Property-based tests for the mantissa kernel.
//!
//! Every routine is checked against `num-bigint` arithmetic on the same
//! words.

use num_bigint::BigUint;
use num_traits::One;
use proptest::prelude::*;

use realcalc_kernel::{mantissa, Kernel};

fn to_big(words: &[u32]) -> BigUint {
    BigUint::from_slice(words)
}

/// `msw · 2^(32n) + dst`, the full result of a kernel multiplication.
fn with_msw(dst: &[u32], msw: u32) -> BigUint {
    (BigUint::from(msw) << (32 * dst.len())) + to_big(dst)
}

fn distance(a: &BigUint, b: &BigUint) -> BigUint {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Mantissa of `n` words with a nonzero top word.
fn mantissa_of(n: usize) -> impl Strategy<Value = Vec<u32>> {
    (prop::collection::vec(any::<u32>(), n - 1), 1u32..=u32::MAX).prop_map(|(mut low, top)| {
        low.push(top);
        low
    })
}

fn mantissa_pair() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
    (3usize..12).prop_flat_map(|n| (mantissa_of(n), mantissa_of(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The top words of the schoolbook product, rounded on the next word.
    #[test]
    fn mul_direct_matches_biguint((a, b) in mantissa_pair()) {
        let n = a.len();
        let mut k = Kernel::new(n).unwrap();
        let mut dst = vec![0u32; n];
        let msw = k.mul_direct(&mut dst, &a, &b, 0, n);
        let exact = (to_big(&a) * to_big(&b)) >> (32 * (n - 1));
        let got = with_msw(&dst, msw);
        prop_assert!(got >= exact);
        prop_assert!(&got - &exact <= BigUint::one(), "n={}", n);
    }

    /// Restoring division: `dst · 2^(32(e − n))` is `a / b` to the last bit.
    #[test]
    fn div_matches_biguint((a, b) in mantissa_pair()) {
        let n = a.len();
        let mut k = Kernel::new(n).unwrap();
        let mut dst = vec![0u32; n];
        let e = k.div(&mut dst, &a, &b, 0, n);
        prop_assert!(e == 0 || e == 1 || e == 2);
        let shift = 32 * (n - usize::try_from(e).unwrap());
        let exact = (to_big(&a) << shift) / to_big(&b);
        let got = to_big(&dst);
        // An overflowing round leaves a single 1 at the top.
        if e == 2 {
            prop_assert_eq!(dst[n - 1], 1);
        } else {
            prop_assert!(distance(&got, &exact) <= BigUint::one(), "n={}", n);
        }
    }

    /// Addition of a word-shifted operand, with rounding on the first
    /// dropped word.
    #[test]
    fn add_shifted_matches_biguint((a, b) in mantissa_pair(), start in 0usize..14) {
        let n = a.len();
        let mut dst = vec![0u32; n];
        let carry = mantissa::add(&mut dst, &a, &b, start);
        let shifted = if start >= n { BigUint::default() } else { to_big(&b) >> (32 * start) };
        let round = start != 0 && start <= n && b[start - 1] & 0x8000_0000 != 0;
        let expected = to_big(&a) + shifted + u32::from(round);
        let got = to_big(&dst) + (BigUint::from(u32::from(carry)) << (32 * n));
        prop_assert_eq!(got, expected);
    }

    /// Subtraction with the borrow turned back into a magnitude.
    #[test]
    fn sub_shifted_matches_biguint((a, b) in mantissa_pair(), start in 1usize..14) {
        let n = a.len();
        let mut dst = vec![0u32; n];
        let borrow = mantissa::sub(&mut dst, &a, &b, start);
        let shifted = if start >= n { BigUint::default() } else { to_big(&b) >> (32 * start) };
        let round = start <= n && b[start - 1] & 0x8000_0000 != 0;
        let part = shifted + u32::from(round);
        let full = to_big(&a);
        prop_assert_eq!(borrow, part > full);
        if borrow {
            mantissa::negate(&mut dst);
            prop_assert_eq!(to_big(&dst), part - full);
        } else {
            prop_assert_eq!(to_big(&dst), full - part);
        }
    }

    /// Single-word scaling keeps every bit: `m · k = carry · 2^(32n) + m'`.
    #[test]
    fn scale_is_exact(a in mantissa_of(5), k in any::<u32>()) {
        let mut m = a.clone();
        let carry = mantissa::scale(&mut m, k);
        prop_assert_eq!(with_msw(&m, carry), to_big(&a) * k);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Convolution and schoolbook multiplication agree to the last word.
    #[test]
    fn convolution_matches_schoolbook(
        (a, b) in (8usize..96).prop_flat_map(|n| (mantissa_of(n), mantissa_of(n))),
    ) {
        let n = a.len();
        let mut k = Kernel::with_threshold(n, 8).unwrap();
        prop_assert!(k.uses_convolution(n));
        let mut direct = vec![0u32; n];
        let mut conv = vec![0u32; n];
        let m1 = k.mul_direct(&mut direct, &a, &b, 0, n);
        let m2 = k.mul(&mut conv, &a, &b, 0, n);
        let d = distance(&with_msw(&direct, m1), &with_msw(&conv, m2));
        prop_assert!(d <= BigUint::one(), "n={}", n);
    }
}
