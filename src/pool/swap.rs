use crate::error::{Error, MathError, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, to_i256};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{
    sqrt_price_at_tick, tick_at_sqrt_price, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use crate::pool::callback::SwapCallback;
use crate::pool::cl_pool::ClPool;
use crate::pool::clock::Clock;
use crate::pool::event::PoolEvent;
use crate::pool::ledger::AssetLedger;
use crate::pool::tick::GlobalAccumulators;
use crate::Q128;
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, trace, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapParams {
    /// Swap direction: `true` for token0 → token1, `false` for token1 → token0.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: I256,
    /// Sqrt‑price limit in Q96 that bounds how far the price is allowed to move.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: I256, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }

    /// Exact input of `amount_in`, bounded only by the price domain.
    pub fn exact_in(zero_for_one: bool, amount_in: U256) -> Result<Self, Error> {
        Ok(Self::new(
            zero_for_one,
            to_i256(amount_in)?,
            Self::widest_limit(zero_for_one),
        ))
    }

    /// Exact output of `amount_out`, bounded only by the price domain.
    pub fn exact_out(zero_for_one: bool, amount_out: U256) -> Result<Self, Error> {
        Ok(Self::new(
            zero_for_one,
            -to_i256(amount_out)?,
            Self::widest_limit(zero_for_one),
        ))
    }

    /// Most permissive valid price limit for a direction.
    pub fn widest_limit(zero_for_one: bool) -> U256 {
        if zero_for_one {
            MIN_SQRT_RATIO + U256::ONE
        } else {
            MAX_SQRT_RATIO - U256::ONE
        }
    }
}

/// Signed token deltas from the pool's point of view: positive amounts
/// were paid in, negative amounts were sent out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub amount0_delta: I256,
    pub amount1_delta: I256,
    pub fees_paid: U256,
}

// values read once at the start of the swap
struct SwapCache {
    // liquidity at the beginning of the swap
    liquidity_start: u128,
    // the timestamp of the current block
    block_timestamp: u32,
    // oracle accumulators at block_timestamp, computed on the first crossing
    latest_observation: Option<GlobalAccumulators>,
}

// the top level state of the swap, the results of which are recorded in the pool at the end
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the global fee growth of the input token
    fee_growth_global_x128: U256,
    // the current liquidity in range
    liquidity: u128,
    // accumulated swap fees
    swap_fee: U256,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tick_next is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
    // how much is being swapped in this step
    amount_in: U256,
    // how much is being swapped out
    amount_out: U256,
    // how much fee is being paid in
    fee_amount: U256,
}

#[inline]
fn checked_add(a: I256, b: I256) -> Result<I256, Error> {
    a.checked_add(b).ok_or_else(|| MathError::Overflow.into())
}

#[inline]
fn checked_sub(a: I256, b: I256) -> Result<I256, Error> {
    a.checked_sub(b).ok_or_else(|| MathError::Overflow.into())
}

impl<L: AssetLedger, C: Clock> ClPool<L, C> {
    /// Swaps against the pool, walking the price across initialized ticks
    /// until the specified amount is used up or `sqrt_price_limit_x96` is
    /// reached.
    ///
    /// The output token is sent to `recipient` first; the callback then
    /// has to pay the input token. Only the input side's balance is checked.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount_specified == 0`.
    /// - [`PoolError::InvalidPriceLimit`] if the limit is on the wrong side
    ///   of the current price or outside the price domain.
    /// - [`PoolError::ZeroLiquidity`] if the pool holds no liquidity at all.
    /// - [`PoolError::InsufficientInputAmount`] if the callback underpays.
    pub fn swap<CB: SwapCallback<L, C>>(
        &mut self,
        recipient: Address,
        params: SwapParams,
        callback: &mut CB,
        data: &[u8],
    ) -> Result<SwapResult, Error> {
        self.guarded(|pool| pool.swap_locked(recipient, params, callback, data))
    }

    fn swap_locked<CB: SwapCallback<L, C>>(
        &mut self,
        recipient: Address,
        params: SwapParams,
        callback: &mut CB,
        data: &[u8],
    ) -> Result<SwapResult, Error> {
        let amount_specified = params.amount_specified;
        if amount_specified.is_zero() {
            return Err(PoolError::ZeroAmount.into());
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        let slot0_start = self.slot0;
        let limit_ok = if zero_for_one {
            sqrt_price_limit_x96 < slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 > MIN_SQRT_RATIO
        } else {
            sqrt_price_limit_x96 > slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 < MAX_SQRT_RATIO
        };
        if !limit_ok {
            warn!(
                zero_for_one,
                ?sqrt_price_limit_x96,
                sqrt_price_x96 = ?slot0_start.sqrt_price_x96,
                "rejected swap price limit"
            );
            return Err(PoolError::InvalidPriceLimit.into());
        }

        if self.liquidity == 0 && self.tick_bitmap.is_empty() {
            return Err(PoolError::ZeroLiquidity.into());
        }

        let mut cache = SwapCache {
            liquidity_start: self.liquidity,
            block_timestamp: self.clock.now(),
            latest_observation: None,
        };

        let exact_input = !amount_specified.is_negative();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: slot0_start.sqrt_price_x96,
            tick: slot0_start.tick,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global0_x128
            } else {
                self.fee_growth_global1_x128
            },
            liquidity: cache.liquidity_start,
            swap_fee: U256::ZERO,
        };

        trace!(
            ?amount_specified,
            zero_for_one,
            exact_input,
            ?sqrt_price_limit_x96,
            tick = state.tick,
            liquidity = state.liquidity,
            "starting swap"
        );

        while !state.amount_specified_remaining.is_zero()
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) =
                self.tick_bitmap.next_initialized_tick_within_one_word(
                    state.tick,
                    self.config.tick_spacing,
                    zero_for_one,
                )?;

            // the bitmap does not know the tick domain
            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

            step.sqrt_price_next_x96 = sqrt_price_at_tick(step.tick_next)?;

            let target = if (zero_for_one && step.sqrt_price_next_x96 < sqrt_price_limit_x96)
                || (!zero_for_one && step.sqrt_price_next_x96 > sqrt_price_limit_x96)
            {
                sqrt_price_limit_x96
            } else {
                step.sqrt_price_next_x96
            };

            let computed = compute_swap_step(
                state.sqrt_price_x96,
                target,
                state.liquidity,
                state.amount_specified_remaining,
                self.config.fee_pips,
            )?;
            state.sqrt_price_x96 = computed.sqrt_ratio_next_x96;
            step.amount_in = computed.amount_in;
            step.amount_out = computed.amount_out;
            step.fee_amount = computed.fee_amount;

            state.swap_fee = state.swap_fee.saturating_add(step.fee_amount);

            let amount_in_with_fee = to_i256(
                step.amount_in
                    .checked_add(step.fee_amount)
                    .ok_or(MathError::Overflow)?,
            )?;
            let amount_out = to_i256(step.amount_out)?;
            if exact_input {
                state.amount_specified_remaining =
                    checked_sub(state.amount_specified_remaining, amount_in_with_fee)?;
                state.amount_calculated = checked_sub(state.amount_calculated, amount_out)?;
            } else {
                state.amount_specified_remaining =
                    checked_add(state.amount_specified_remaining, amount_out)?;
                state.amount_calculated =
                    checked_add(state.amount_calculated, amount_in_with_fee)?;
            }

            // fees in a liquidity gap go to nobody
            if state.liquidity > 0 {
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(
                    mul_div(step.fee_amount, Q128, U256::from(state.liquidity))?,
                );
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    let latest = match cache.latest_observation {
                        Some(latest) => latest,
                        None => {
                            let latest = self.global_accumulators(cache.block_timestamp)?;
                            cache.latest_observation = Some(latest);
                            latest
                        }
                    };
                    let globals = GlobalAccumulators {
                        fee_growth_global0_x128: if zero_for_one {
                            state.fee_growth_global_x128
                        } else {
                            self.fee_growth_global0_x128
                        },
                        fee_growth_global1_x128: if zero_for_one {
                            self.fee_growth_global1_x128
                        } else {
                            state.fee_growth_global_x128
                        },
                        ..latest
                    };
                    let mut liquidity_net = self.ticks.cross(step.tick_next, &globals);
                    // crossing leftward removes what crossing rightward adds
                    if zero_for_one {
                        liquidity_net = liquidity_net.checked_neg().ok_or(MathError::Overflow)?;
                    }
                    state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                    trace!(
                        tick = step.tick_next,
                        liquidity_net,
                        liquidity = state.liquidity,
                        "crossed tick"
                    );
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                // moved within the word without reaching the next tick
                state.tick = tick_at_sqrt_price(state.sqrt_price_x96)?;
            }

            trace!(
                sqrt_price_x96 = ?state.sqrt_price_x96,
                amount_in = ?step.amount_in,
                amount_out = ?step.amount_out,
                fee_amount = ?step.fee_amount,
                tick_next = step.tick_next,
                tick = state.tick,
                remaining = ?state.amount_specified_remaining,
                "swap step"
            );
        }

        if state.tick != slot0_start.tick {
            self.write_observation(cache.block_timestamp, slot0_start.tick, cache.liquidity_start);
            self.slot0.tick = state.tick;
        }
        self.slot0.sqrt_price_x96 = state.sqrt_price_x96;

        if cache.liquidity_start != state.liquidity {
            self.liquidity = state.liquidity;
        }

        if zero_for_one {
            self.fee_growth_global0_x128 = state.fee_growth_global_x128;
        } else {
            self.fee_growth_global1_x128 = state.fee_growth_global_x128;
        }

        let specified_used = checked_sub(amount_specified, state.amount_specified_remaining)?;
        let (amount0, amount1) = if zero_for_one == exact_input {
            (specified_used, state.amount_calculated)
        } else {
            (state.amount_calculated, specified_used)
        };

        let (token0, token1, this) = (
            self.config.token0,
            self.config.token1,
            self.config.pool_address,
        );
        if zero_for_one {
            if amount1.is_negative() {
                self.ledger
                    .transfer(token1, this, recipient, amount1.unsigned_abs())?;
            }
            let balance0_before = self.balance0();
            callback.swap_callback(self, amount0, amount1, data)?;
            self.require_paid(balance0_before, amount0.max(I256::ZERO).into_raw(), self.balance0())?;
        } else {
            if amount0.is_negative() {
                self.ledger
                    .transfer(token0, this, recipient, amount0.unsigned_abs())?;
            }
            let balance1_before = self.balance1();
            callback.swap_callback(self, amount0, amount1, data)?;
            self.require_paid(balance1_before, amount1.max(I256::ZERO).into_raw(), self.balance1())?;
        }

        debug!(
            pool = ?this,
            ?recipient,
            ?amount0,
            ?amount1,
            sqrt_price_x96 = ?state.sqrt_price_x96,
            liquidity = state.liquidity,
            tick = state.tick,
            "swap"
        );
        self.events.push(PoolEvent::Swap {
            recipient,
            amount0,
            amount1,
            sqrt_price_x96: state.sqrt_price_x96,
            liquidity: state.liquidity,
            tick: state.tick,
        });

        Ok(SwapResult {
            amount0_delta: amount0,
            amount1_delta: amount1,
            fees_paid: state.swap_fee,
        })
    }
}
