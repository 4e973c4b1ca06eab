use crate::error::Error;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math::{
    amount_0_delta, amount_1_delta, next_sqrt_price_from_input, next_sqrt_price_from_output,
};
use crate::U256_E6;
use alloy_primitives::{I256, U256};

/// Result of swapping within one constant‑liquidity segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Price reached; equals the target when the segment was exhausted.
    pub sqrt_ratio_next_x96: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Computes one swap segment from `sqrt_ratio_current_x96` toward
/// `sqrt_ratio_target_x96`.
///
/// A positive `amount_remaining` is exact input (fee taken before the
/// price moves), a negative one is exact output (fee added on top of
/// the input). Input amounts round up and output amounts round down.
/// Zero `liquidity` is legal and walks straight to the target.
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<SwapStep, Error> {
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = !amount_remaining.is_negative();
    let fee = U256::from(fee_pips);
    let fee_complement = U256_E6 - fee;
    let remaining_abs = amount_remaining.unsigned_abs();

    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;

    let sqrt_ratio_next_x96 = if exact_in {
        let amount_remaining_less_fee = mul_div(remaining_abs, fee_complement, U256_E6)?;
        amount_in = if zero_for_one {
            amount_0_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, true)?
        } else {
            amount_1_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, true)?
        };
        if amount_remaining_less_fee >= amount_in {
            sqrt_ratio_target_x96
        } else {
            next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        }
    } else {
        amount_out = if zero_for_one {
            amount_1_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, false)?
        } else {
            amount_0_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, false)?
        };
        if remaining_abs >= amount_out {
            sqrt_ratio_target_x96
        } else {
            next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                remaining_abs,
                zero_for_one,
            )?
        }
    };

    let max = sqrt_ratio_target_x96 == sqrt_ratio_next_x96;

    // reuse the amount computed above when the target was reached
    if zero_for_one {
        if !(max && exact_in) {
            amount_in =
                amount_0_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !(max && !exact_in) {
            amount_out =
                amount_1_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !(max && exact_in) {
            amount_in =
                amount_1_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, true)?;
        }
        if !(max && !exact_in) {
            amount_out =
                amount_0_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, false)?;
        }
    }

    // exact output never pays out more than asked
    if !exact_in && amount_out > remaining_abs {
        amount_out = remaining_abs;
    }

    let fee_amount = if exact_in && sqrt_ratio_next_x96 != sqrt_ratio_target_x96 {
        // the price moved less than a full step, the leftover is all fee
        remaining_abs - amount_in
    } else {
        mul_div_rounding_up(amount_in, fee, fee_complement)?
    };

    Ok(SwapStep {
        sqrt_ratio_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    })
}
