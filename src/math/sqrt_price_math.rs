use crate::math::math_helpers::{div_rounding_up, mul_div, mul_div_rounding_up, to_i256};
use crate::{
    error::{Error, MathError, PriceError},
    Q96, RESOLUTION, U160_MAX,
};
use alloy_primitives::{I256, U256};

#[inline]
fn to_u160(x: U256) -> Result<U256, Error> {
    if x > U160_MAX {
        return Err(MathError::Overflow.into());
    }
    Ok(x)
}

/// Next sqrt price after adding or removing `amount` of token0, rounded up.
///
/// Rounding up keeps the price from moving further than the amount
/// justifies in either direction.
pub fn next_sqrt_price_from_amount_0_rounding_up(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    if amount.is_zero() {
        return Ok(sqrt_p_x96);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let (product, overflow) = amount.overflowing_mul(sqrt_p_x96);

    if add {
        if !overflow {
            let (denominator, overflow) = numerator1.overflowing_add(product);
            if !overflow {
                return to_u160(mul_div_rounding_up(numerator1, sqrt_p_x96, denominator)?);
            }
        }
        // L / (L / P + x), slightly less precise but cannot overflow the product
        let denominator = (numerator1 / sqrt_p_x96)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        Ok(div_rounding_up(numerator1, denominator)?)
    } else {
        if overflow || numerator1 <= product {
            return Err(PriceError::InsufficientReserves.into());
        }
        to_u160(mul_div_rounding_up(numerator1, sqrt_p_x96, numerator1 - product)?)
    }
}

/// Next sqrt price after adding or removing `amount` of token1, rounded down.
pub fn next_sqrt_price_from_amount_1_rounding_down(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient = if amount <= U160_MAX {
            (amount << RESOLUTION) / liquidity
        } else {
            mul_div(amount, Q96, liquidity)?
        };
        let next = sqrt_p_x96
            .checked_add(quotient)
            .ok_or(MathError::Overflow)?;
        to_u160(next)
    } else {
        let quotient = if amount <= U160_MAX {
            div_rounding_up(amount << RESOLUTION, liquidity)?
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };
        if sqrt_p_x96 <= quotient {
            return Err(PriceError::InsufficientReserves.into());
        }
        Ok(sqrt_p_x96 - quotient)
    }
}

/// Next sqrt price after `amount_in` of the input token enters the pool.
///
/// # Errors
///
/// - [`PriceError::SqrtPriceIsZero`] / [`PriceError::LiquidityIsZero`] on degenerate state.
/// - [`MathError::Overflow`] if the price leaves the 160‑bit range.
pub fn next_sqrt_price_from_input(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(PriceError::LiquidityIsZero.into());
    }

    if zero_for_one {
        next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price after `amount_out` of the output token leaves the pool.
///
/// # Errors
///
/// - [`PriceError::InsufficientReserves`] if the output would drain the virtual reserve.
pub fn next_sqrt_price_from_output(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(PriceError::LiquidityIsZero.into());
    }

    if zero_for_one {
        next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_out, false)
    }
}

/// `L * (sqrt(b) - sqrt(a)) / (sqrt(a) * sqrt(b))`, the token0 held by
/// `liquidity` between two prices.
pub fn amount_0_delta(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        std::mem::swap(&mut sqrt_ratio_a_x96, &mut sqrt_ratio_b_x96);
    }
    if sqrt_ratio_a_x96.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b_x96)?,
            sqrt_ratio_a_x96,
        )?)
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_b_x96)? / sqrt_ratio_a_x96)
    }
}

/// `L * (sqrt(b) - sqrt(a))`, the token1 held by `liquidity` between two prices.
pub fn amount_1_delta(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        std::mem::swap(&mut sqrt_ratio_a_x96, &mut sqrt_ratio_b_x96);
    }
    let liquidity = U256::from(liquidity);
    let spread = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        mul_div_rounding_up(liquidity, spread, Q96)
    } else {
        mul_div(liquidity, spread, Q96)
    }
}

/// Signed token0 delta for a signed liquidity change.
///
/// Adding liquidity rounds up (owed to the pool), removing rounds down
/// and comes back negative.
pub fn signed_amount_0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, Error> {
    let magnitude = amount_0_delta(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity >= 0,
    )?;
    let magnitude = to_i256(magnitude)?;
    Ok(if liquidity < 0 { -magnitude } else { magnitude })
}

/// Signed token1 delta for a signed liquidity change.
pub fn signed_amount_1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, Error> {
    let magnitude = amount_1_delta(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity >= 0,
    )?;
    let magnitude = to_i256(magnitude)?;
    Ok(if liquidity < 0 { -magnitude } else { magnitude })
}
