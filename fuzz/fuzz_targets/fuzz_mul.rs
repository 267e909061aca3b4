#![no_main]

use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;

use realcalc_kernel::Kernel;

fn with_msw(dst: &[u32], msw: u32) -> BigUint {
    (BigUint::from(msw) << (32 * dst.len())) + BigUint::from_slice(dst)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 1 + 2 * 8 * 4 {
        return;
    }
    let words: Vec<u32> = data[1..]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    // Two operands of n words, n in 8..=64, capped by the input length.
    let n = (8 + usize::from(data[0]) % 57).min(words.len() / 2);
    let mut a = words[..n].to_vec();
    let mut b = words[n..2 * n].to_vec();
    a[n - 1] |= 1;
    b[n - 1] |= 1;

    let (Ok(mut direct), Ok(mut conv)) = (Kernel::new(n), Kernel::with_threshold(n, 8)) else {
        return;
    };
    let mut d = vec![0u32; n];
    let mut c = vec![0u32; n];
    let md = direct.mul_direct(&mut d, &a, &b, 0, n);
    let mc = conv.mul(&mut c, &a, &b, 0, n);

    let (x, y) = (with_msw(&d, md), with_msw(&c, mc));
    let diff = if x > y { x - y } else { y - x };
    assert!(diff <= BigUint::from(1u32), "direct != convolution at n={n}");
});
