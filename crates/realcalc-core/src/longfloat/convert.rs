//! Conversions between LongFloat, `f64`, integers and decimal strings, plus
//! integer rounding.

use realcalc_kernel::arith::add_scalar;
use realcalc_kernel::{host, mantissa, Kernel};

use super::{Kind, LongFloat};
use crate::RealError;

/// Largest power of ten that fits a positive `i32`.
const CHUNK_DIGITS: usize = 9;

impl LongFloat {
    /// Nearest LongFloat of `words` words to `x`. Exact for every finite `x`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(x: f64, words: usize) -> Self {
        if x.is_nan() {
            return Self::from_special(Kind::NaN, false, words);
        }
        let negative = x.is_sign_negative();
        if x.is_infinite() {
            return Self::from_special(Kind::Infinity, negative, words);
        }
        if x == 0.0 {
            return Self::from_special(Kind::Zero, negative, words);
        }
        let (m, e) = host::frexp(x.abs());
        let exp32 = (e + 31) >> 5;
        // y in [1, 2^32): the top word is its integer part.
        let mut y = host::ldexp(m, e - 32 * (exp32 - 1));
        let mut m = vec![0; words];
        for slot in m.iter_mut().rev().take(3) {
            let w = y.floor();
            *slot = w as u32;
            y = (y - w) * 4_294_967_296.0;
        }
        Self::from_parts(negative, exp32, m)
    }

    /// Nearest `f64` (by truncation of the words below the top three).
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        let v = match self.kind {
            Kind::NaN => return f64::NAN,
            Kind::Infinity => f64::INFINITY,
            Kind::Zero => 0.0,
            Kind::Normal => {
                let bits = (i64::from(self.exponent) - 1) * 32;
                #[allow(clippy::cast_possible_truncation)]
                let bits = bits.clamp(-2000, 2000) as i32;
                host::ldexp(self.top_words_f64(), bits)
            }
        };
        if self.negative {
            -v
        } else {
            v
        }
    }

    /// Magnitude of the mantissa read as a fraction in `[2^-32, 1)`.
    #[must_use]
    pub fn mantissa_as_f64(&self) -> f64 {
        self.top_words_f64() / 4_294_967_296.0
    }

    /// `m[n-1] + m[n-2]·2^-32 + m[n-3]·2^-64`.
    fn top_words_f64(&self) -> f64 {
        self.mantissa
            .iter()
            .rev()
            .take(3)
            .rev()
            .fold(0.0, |acc, &w| acc / 4_294_967_296.0 + f64::from(w))
    }

    /// Truncate to an `i32`, or `None` when the integer part does not fit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_i32(&self) -> Option<i32> {
        let v = self.as_f64().trunc();
        (v.is_finite() && v.abs() <= f64::from(i32::MAX)).then_some(v as i32)
    }

    /// Bit exponent: a normal value lies in `[2^(b−1), 2^b)`. Zero maps to
    /// `i32::MIN`, infinities and NaN to `i32::MAX`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize(&self) -> i32 {
        match self.kind {
            Kind::Zero => i32::MIN,
            Kind::Infinity | Kind::NaN => i32::MAX,
            Kind::Normal => self
                .bit_exponent()
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        }
    }

    /// Unsaturated bit exponent of a normal value.
    fn bit_exponent(&self) -> i64 {
        let top = self.mantissa[self.mantissa.len() - 1];
        32 * i64::from(self.exponent) - i64::from(host::clz(top))
    }

    /// Round to the nearest integer, ties away from zero.
    pub fn round_assign(&mut self) {
        self.round_integer(true);
    }

    #[must_use]
    pub fn round(&self) -> Self {
        let mut r = self.clone();
        r.round_assign();
        r
    }

    /// Drop the fractional part.
    pub fn round_toward_zero_assign(&mut self) {
        self.round_integer(false);
    }

    #[must_use]
    pub fn round_toward_zero(&self) -> Self {
        let mut r = self.clone();
        r.round_toward_zero_assign();
        r
    }

    fn round_integer(&mut self, nearest: bool) {
        if self.kind != Kind::Normal {
            return;
        }
        let n = self.mantissa.len();
        let e = self.exponent;
        if e >= i32::try_from(n).unwrap_or(i32::MAX) {
            return;
        }
        if e <= 0 {
            let half = e == 0 && self.mantissa[n - 1] & 0x8000_0000 != 0;
            if nearest && half {
                let negative = self.negative;
                *self = Self::from_i32(1, 0, n);
                self.negative = negative;
            } else {
                self.set_special(Kind::Zero, self.negative);
            }
            return;
        }
        #[allow(clippy::cast_sign_loss)]
        let frac = n - e as usize;
        let up = nearest && self.mantissa[frac - 1] & 0x8000_0000 != 0;
        self.mantissa[..frac].fill(0);
        if up && add_scalar(&mut self.mantissa[frac..], 1) != 0 {
            let adj = mantissa::adjust_for_carry(&mut self.mantissa, 1);
            self.offset_exponent(adj);
        }
    }

    /// Parse `[+-]digits[.digits][(e|E)[+-]digits]`, or `NaN`, `Infinity`,
    /// `inf` with an optional sign.
    pub fn from_str(s: &str, kernel: &mut Kernel) -> Result<Self, RealError> {
        let n = kernel.precision();
        let invalid = || RealError::InvalidArgument(format!("malformed number: {s:?}"));
        let t = s.trim();
        let (negative, body) = match t.as_bytes().first() {
            Some(b'-') => (true, &t[1..]),
            Some(b'+') => (false, &t[1..]),
            _ => (false, t),
        };
        if body.eq_ignore_ascii_case("nan") {
            return Ok(Self::from_special(Kind::NaN, false, n));
        }
        if body.eq_ignore_ascii_case("infinity") || body.eq_ignore_ascii_case("inf") {
            return Ok(Self::from_special(Kind::Infinity, negative, n));
        }

        let (num, exp) = match body.find(['e', 'E']) {
            Some(pos) => {
                let exp = &body[pos + 1..];
                let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let exp: i32 = exp.parse().map_err(|_| {
                    RealError::InvalidArgument(format!("exponent out of range: {s:?}"))
                })?;
                (&body[..pos], exp)
            }
            None => (body, 0),
        };
        let (int, frac) = num.split_once('.').unwrap_or((num, ""));
        if (int.is_empty() && frac.is_empty())
            || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let scale = i32::try_from(frac.len())
            .ok()
            .and_then(|f| exp.checked_sub(f))
            .ok_or_else(|| RealError::InvalidArgument(format!("exponent out of range: {s:?}")))?;

        let digits: Vec<u8> = int.bytes().chain(frac.bytes()).map(|b| b - b'0').collect();
        let mut value = Self::zero(n);
        for chunk in digits.chunks(CHUNK_DIGITS) {
            let mut word = 0i32;
            let mut shift = 1i32;
            for &d in chunk {
                word = word * 10 + i32::from(d);
                shift *= 10;
            }
            value.mul_i32_assign(shift);
            value.add_assign(&Self::from_i32(word, 0, n), kernel);
        }
        if !value.is_zero() && scale != 0 {
            let power = Self::from_i32(10, 0, n).pow(scale.saturating_abs(), kernel);
            if scale > 0 {
                value.mul_assign(&power, kernel);
            } else {
                value.div_assign(&power, kernel);
            }
        }
        value.negative = negative;
        Ok(value)
    }

    /// Scientific notation with `digits` significant digits, rounded to
    /// nearest: `[-]d.ddd…e±N`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn as_decimal(&self, digits: usize, kernel: &mut Kernel) -> String {
        let digits = digits.max(1);
        match self.kind {
            Kind::NaN => return "NaN".to_string(),
            Kind::Infinity if self.negative => return "-Infinity".to_string(),
            Kind::Infinity => return "Infinity".to_string(),
            Kind::Zero => return format_scientific(false, &vec![0; digits], 0),
            Kind::Normal => {}
        }
        let n = self.mantissa.len();
        let mut dexp = ((self.bit_exponent() - 1) as f64 * std::f64::consts::LOG10_2).floor() as i64;
        let ten = Self::from_i32(10, 0, n);
        let one = Self::from_i32(1, 0, n);
        let mut f = self.abs();
        // Word exponents near the ends of i32 need powers of ten beyond it.
        let mut pending = dexp;
        while pending != 0 {
            let step = i32::try_from(pending.unsigned_abs()).unwrap_or(i32::MAX);
            let scale = ten.pow(step, kernel);
            if pending > 0 {
                f.div_assign(&scale, kernel);
                pending -= i64::from(step);
            } else {
                f.mul_assign(&scale, kernel);
                pending += i64::from(step);
            }
        }
        while f >= ten {
            f.div_i32_assign(10);
            dexp += 1;
        }
        while f < one {
            f.mul_i32_assign(10);
            dexp -= 1;
        }

        // f in [1, 10): exponent 1, integer digit in the top word.
        let mut frac = f.mantissa;
        let mut out = Vec::with_capacity(digits);
        out.push(frac[n - 1] as u8);
        frac[n - 1] = 0;
        for _ in 1..digits {
            mantissa::scale(&mut frac, 10);
            out.push(frac[n - 1] as u8);
            frac[n - 1] = 0;
        }
        if frac[n - 2] & 0x8000_0000 != 0 {
            let mut i = digits;
            loop {
                if i == 0 {
                    out.insert(0, 1);
                    out.pop();
                    dexp += 1;
                    break;
                }
                i -= 1;
                if out[i] == 9 {
                    out[i] = 0;
                } else {
                    out[i] += 1;
                    break;
                }
            }
        }
        format_scientific(self.negative, &out, dexp)
    }
}

fn format_scientific(negative: bool, digits: &[u8], exp: i64) -> String {
    let mut s = String::with_capacity(digits.len() + 8);
    if negative {
        s.push('-');
    }
    for (i, d) in digits.iter().enumerate() {
        if i == 1 {
            s.push('.');
        }
        s.push(char::from(b'0' + d));
    }
    let sign = if exp < 0 { '-' } else { '+' };
    s.push('e');
    s.push(sign);
    s.push_str(&exp.unsigned_abs().to_string());
    s
}
