//! Constants for kernel sizing and multiplication thresholds.

/// Default operand length (in words) at which multiplication switches to convolution.
pub const DEFAULT_CONVOLUTION_THRESHOLD: usize = 60;

/// Default recursion cap for the lazy evaluator that drives precision escalation.
pub const DEFAULT_EVALUATION_DEPTH: usize = 500;

/// Smallest supported working precision (in words).
///
/// Conversions to `f64` and error magnitudes read the top three words.
pub const MIN_WORKING_PRECISION: usize = 3;

/// Smallest transform size used by the convolution path.
pub const MIN_CONVOLUTION_SIZE: usize = 16;

/// Bits per mantissa word.
pub const WORD_BITS: u32 = 32;

/// Bits per convolution limb. Two limbs make a word.
pub const LIMB_BITS: u32 = 16;

/// Top bit of a mantissa word.
pub const WORD_TOP_BIT: u32 = 1 << 31;

/// Decimal digits carried by one 32-bit word (32 * log10(2)).
pub const DIGITS_PER_WORD: f64 = 9.632_959_861_247_398;

/// Smallest transform size able to hold the product of two `len`-word operands.
#[must_use]
pub fn convolution_size(len: usize) -> usize {
    (len * 4).next_power_of_two().max(MIN_CONVOLUTION_SIZE)
}
