use crate::error::MathError;
use alloy_primitives::{I256, U256};

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Computes `floor(a * b / denominator)` with a 512‑bit intermediate
/// product, so the result is exact whenever it fits in 256 bits.
///
/// # Errors
///
/// - [`MathError::DivisionByZero`] if `denominator == 0`.
/// - [`MathError::Overflow`] if the quotient does not fit in a `U256`.
#[inline]
pub fn mul_div(a: U256, b: U256, mut denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    // [prod1 prod0] = a * b as a 512-bit value
    let mm = a.mul_mod(b, U256::MAX);
    let mut prod0 = a.wrapping_mul(b);
    let (mut prod1, borrow) = mm.overflowing_sub(prod0);
    if borrow {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    if denominator <= prod1 {
        return Err(MathError::Overflow);
    }

    // make the product exactly divisible by subtracting the remainder
    let remainder = a.mul_mod(b, denominator);
    let (reduced, borrow) = prod0.overflowing_sub(remainder);
    prod0 = reduced;
    if borrow {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    // factor powers of two out of the denominator
    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    // flip twos into 2^256 / twos and shift prod1 bits into prod0
    let twos = twos.wrapping_neg().wrapping_div(twos).wrapping_add(U256::ONE);
    prod0 |= prod1.wrapping_mul(twos);

    // inverse of the odd denominator mod 2^256, correct to 4 bits then
    // doubled by each Newton-Raphson step
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;
    for _ in 0..6 {
        inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)));
    }

    Ok(prod0.wrapping_mul(inv))
}

/// Like [`mul_div`] but rounds up when the division leaves a remainder.
///
/// # Errors
///
/// Same as [`mul_div`], plus [`MathError::Overflow`] if rounding up
/// would exceed `U256::MAX`.
#[inline]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;
    if a.mul_mod(b, denominator).is_zero() {
        return Ok(result);
    }
    result.checked_add(U256::ONE).ok_or(MathError::Overflow)
}

/// `ceil(a / b)`.
///
/// # Errors
///
/// - [`MathError::DivisionByZero`] if `b == 0`.
#[inline]
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        // quotient < MAX whenever b > 1, and b == 1 never leaves a remainder
        Ok(quotient + U256::ONE)
    }
}

/// Reinterprets `x` as a non‑negative `I256`.
///
/// # Errors
///
/// - [`MathError::Overflow`] if `x >= 2^255`.
#[inline]
pub fn to_i256(x: U256) -> Result<I256, MathError> {
    if x.bit(255) {
        return Err(MathError::Overflow);
    }
    Ok(I256::from_raw(x))
}
