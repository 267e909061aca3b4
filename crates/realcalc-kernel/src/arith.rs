//! Word-level arithmetic on `u32` limbs through native 64-bit intermediates.

/// Add with carry: a + b + carry -> (sum, `new_carry`)
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn add_with_carry(a: u32, b: u32, carry: u32) -> (u32, u32) {
    let sum = u64::from(a) + u64::from(b) + u64::from(carry);
    (sum as u32, (sum >> 32) as u32)
}

/// Subtract with borrow: a - b - borrow -> (diff, `new_borrow`)
#[inline]
#[must_use]
pub fn sub_with_borrow(a: u32, b: u32, borrow: u32) -> (u32, u32) {
    let (d1, o1) = a.overflowing_sub(b);
    let (d2, o2) = d1.overflowing_sub(borrow);
    (d2, u32::from(o1 || o2))
}

/// Multiply: a * b -> (low, high)
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mul_wide(a: u32, b: u32) -> (u32, u32) {
    let prod = u64::from(a) * u64::from(b);
    (prod as u32, (prod >> 32) as u32)
}

/// Multiply-accumulate: a * b + c + carry -> (low, high). Never overflows 64 bits.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mul_add(a: u32, b: u32, c: u32, carry: u32) -> (u32, u32) {
    let v = u64::from(a) * u64::from(b) + u64::from(c) + u64::from(carry);
    (v as u32, (v >> 32) as u32)
}

/// Add a scalar to a word slice, returning the carry out of the top word.
pub fn add_scalar(data: &mut [u32], scalar: u32) -> u32 {
    let mut carry = scalar;
    for limb in data.iter_mut() {
        let (sum, c) = add_with_carry(*limb, carry, 0);
        *limb = sum;
        carry = c;
        if carry == 0 {
            break;
        }
    }
    carry
}

/// Subtract a scalar from a word slice, returning the borrow out of the top word.
pub fn sub_scalar(data: &mut [u32], scalar: u32) -> u32 {
    let mut borrow = scalar;
    for limb in data.iter_mut() {
        let (diff, b) = sub_with_borrow(*limb, borrow, 0);
        *limb = diff;
        borrow = b;
        if borrow == 0 {
            break;
        }
    }
    borrow
}

/// Is the top bit of `w` set? Used for round-to-nearest on discarded words.
#[inline]
#[must_use]
pub fn rounds_up(w: u32) -> bool {
    w & crate::constants::WORD_TOP_BIT != 0
}
