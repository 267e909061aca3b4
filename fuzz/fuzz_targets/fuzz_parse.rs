#![no_main]

use libfuzzer_sys::fuzz_target;

use realcalc_core::{Context, Estimate};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    // Long exponents make the power of ten expensive; keep inputs short.
    if s.len() > 40 {
        return;
    }
    let Ok(mut ctx) = Context::with_precision(4) else {
        return;
    };

    // Should not panic
    let Ok(x) = Estimate::from_str(&mut ctx, s) else {
        return;
    };
    if x.value().is_finite() {
        let _ = x.weak_as_decimal(20, &mut ctx);
        let _ = x.sqrt(&mut ctx);
        let _ = x.recip(&mut ctx);
    }
});
