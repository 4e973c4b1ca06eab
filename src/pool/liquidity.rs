use crate::error::{Error, MathError, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::sqrt_price_math::{signed_amount_0_delta, signed_amount_1_delta};
use crate::math::tick_math::sqrt_price_at_tick;
use crate::pool::callback::MintCallback;
use crate::pool::cl_pool::ClPool;
use crate::pool::clock::Clock;
use crate::pool::event::PoolEvent;
use crate::pool::ledger::AssetLedger;
use crate::pool::position::{PositionInfo, PositionKey};
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, warn};

/// Amounts a liquidity change owes to (positive) or releases from
/// (negative) the pool.
struct ModifiedPosition {
    position: PositionInfo,
    amount0: I256,
    amount1: I256,
}

fn liquidity_to_delta(amount: u128, negate: bool) -> Result<i128, Error> {
    let delta = i128::try_from(amount).map_err(|_| MathError::Overflow)?;
    Ok(if negate { -delta } else { delta })
}

fn positive_part(amount: I256) -> U256 {
    if amount.is_negative() {
        U256::ZERO
    } else {
        amount.into_raw()
    }
}

impl<L: AssetLedger, C: Clock> ClPool<L, C> {
    /// Touches both boundary ticks and the position, then computes the
    /// token amounts for the liquidity change against the current price.
    fn modify_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<ModifiedPosition, Error> {
        self.check_ticks(tick_lower, tick_upper)?;

        let position = self.update_position(owner, tick_lower, tick_upper, liquidity_delta)?;

        let mut amount0 = I256::ZERO;
        let mut amount1 = I256::ZERO;
        if liquidity_delta != 0 {
            let tick = self.slot0.tick;
            let sqrt_lower = sqrt_price_at_tick(tick_lower)?;
            let sqrt_upper = sqrt_price_at_tick(tick_upper)?;

            if tick < tick_lower {
                // range sits above the price, held entirely in token0
                amount0 = signed_amount_0_delta(sqrt_lower, sqrt_upper, liquidity_delta)?;
            } else if tick < tick_upper {
                let liquidity_before = self.liquidity;
                self.write_observation(self.clock.now(), tick, liquidity_before);

                let sqrt_price = self.slot0.sqrt_price_x96;
                amount0 = signed_amount_0_delta(sqrt_price, sqrt_upper, liquidity_delta)?;
                amount1 = signed_amount_1_delta(sqrt_lower, sqrt_price, liquidity_delta)?;
                self.liquidity = add_delta(liquidity_before, liquidity_delta)?;
            } else {
                // range sits below the price, held entirely in token1
                amount1 = signed_amount_1_delta(sqrt_lower, sqrt_upper, liquidity_delta)?;
            }
        }

        Ok(ModifiedPosition {
            position,
            amount0,
            amount1,
        })
    }

    fn update_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<PositionInfo, Error> {
        let tick = self.slot0.tick;
        let mut flipped_lower = false;
        let mut flipped_upper = false;

        if liquidity_delta != 0 {
            let globals = self.global_accumulators(self.clock.now())?;
            let max_liquidity = self.max_liquidity_per_tick;

            flipped_lower = self.ticks.update(
                tick_lower,
                tick,
                liquidity_delta,
                &globals,
                false,
                max_liquidity,
            )?;
            flipped_upper = self.ticks.update(
                tick_upper,
                tick,
                liquidity_delta,
                &globals,
                true,
                max_liquidity,
            )?;

            if flipped_lower {
                self.tick_bitmap
                    .flip_tick(tick_lower, self.config.tick_spacing)?;
            }
            if flipped_upper {
                self.tick_bitmap
                    .flip_tick(tick_upper, self.config.tick_spacing)?;
            }
        }

        let (fee_growth_inside0_x128, fee_growth_inside1_x128) = self.ticks.fee_growth_inside(
            tick_lower,
            tick_upper,
            tick,
            self.fee_growth_global0_x128,
            self.fee_growth_global1_x128,
        );

        let position = self.positions.update(
            PositionKey::new(owner, tick_lower, tick_upper),
            liquidity_delta,
            fee_growth_inside0_x128,
            fee_growth_inside1_x128,
        )?;

        // a tick emptied by a burn must not leak stale outside values
        if liquidity_delta < 0 {
            if flipped_lower {
                self.ticks.clear(tick_lower);
            }
            if flipped_upper {
                self.ticks.clear(tick_upper);
            }
        }

        Ok(position)
    }

    /// Adds `amount` of liquidity for `owner` on `[tick_lower, tick_upper)`.
    ///
    /// The callback must pay the returned `(amount0, amount1)` into the
    /// pool's ledger account before it returns.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount == 0`.
    /// - [`PoolError::InvalidRange`] for a malformed range.
    /// - [`PoolError::LiquidityOverflow`] if a boundary would exceed the
    ///   per‑tick cap.
    /// - [`PoolError::InsufficientInputAmount`] if the callback underpays.
    pub fn mint<CB: MintCallback<L, C>>(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        callback: &mut CB,
        data: &[u8],
    ) -> Result<(U256, U256), Error> {
        self.guarded(|pool| {
            if amount == 0 {
                return Err(PoolError::ZeroAmount.into());
            }
            let modified =
                pool.modify_position(owner, tick_lower, tick_upper, liquidity_to_delta(amount, false)?)?;
            let amount0 = positive_part(modified.amount0);
            let amount1 = positive_part(modified.amount1);

            let balance0_before = (!amount0.is_zero()).then(|| pool.balance0());
            let balance1_before = (!amount1.is_zero()).then(|| pool.balance1());

            callback.mint_callback(pool, amount0, amount1, data)?;

            if let Some(before) = balance0_before {
                pool.require_paid(before, amount0, pool.balance0())?;
            }
            if let Some(before) = balance1_before {
                pool.require_paid(before, amount1, pool.balance1())?;
            }

            debug!(
                pool = ?pool.config.pool_address,
                ?owner,
                tick_lower,
                tick_upper,
                amount,
                ?amount0,
                ?amount1,
                "mint"
            );
            pool.events.push(PoolEvent::Mint {
                owner,
                tick_lower,
                tick_upper,
                amount,
                amount0,
                amount1,
            });
            Ok((amount0, amount1))
        })
    }

    /// Fails with `InsufficientInputAmount` unless the balance grew from
    /// `before` by at least `owed`.
    pub(crate) fn require_paid(&self, before: U256, owed: U256, after: U256) -> Result<(), Error> {
        match before.checked_add(owed) {
            Some(required) if required <= after => Ok(()),
            _ => {
                warn!(pool = ?self.config.pool_address, ?before, ?owed, ?after, "payment short");
                Err(PoolError::InsufficientInputAmount.into())
            }
        }
    }

    /// Removes `amount` of liquidity from the caller's position and credits
    /// the released tokens to its owed balances. Nothing is transferred;
    /// see [`ClPool::collect`].
    ///
    /// `amount == 0` is a poke: it only settles accrued fees.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidRange`] for a malformed range.
    /// - [`PoolError::InsufficientLiquidity`] if `amount` exceeds the position.
    /// - [`PoolError::NoPosition`] when poking a position without liquidity.
    pub fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        self.guarded(|pool| {
            let modified =
                pool.modify_position(owner, tick_lower, tick_upper, liquidity_to_delta(amount, true)?)?;
            let amount0 = (-modified.amount0).into_raw();
            let amount1 = (-modified.amount1).into_raw();

            if !amount0.is_zero() || !amount1.is_zero() {
                let owed0 = u128::try_from(amount0).map_err(|_| MathError::Overflow)?;
                let owed1 = u128::try_from(amount1).map_err(|_| MathError::Overflow)?;
                pool.positions.credit_owed(
                    &PositionKey::new(owner, tick_lower, tick_upper),
                    owed0,
                    owed1,
                )?;
            }

            debug!(
                pool = ?pool.config.pool_address,
                ?owner,
                tick_lower,
                tick_upper,
                amount,
                ?amount0,
                ?amount1,
                liquidity_left = modified.position.liquidity,
                "burn"
            );
            pool.events.push(PoolEvent::Burn {
                owner,
                tick_lower,
                tick_upper,
                amount,
                amount0,
                amount1,
            });
            Ok((amount0, amount1))
        })
    }

    /// Pays `min(requested, owed)` of each token from `owner`'s position
    /// to `recipient`. Ticks are not validated; an unknown position pays
    /// nothing.
    pub fn collect(
        &mut self,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        self.guarded(|pool| {
            let key = PositionKey::new(owner, tick_lower, tick_upper);
            let (amount0, amount1) =
                pool.positions
                    .take_owed(&key, amount0_requested, amount1_requested);

            let (token0, token1, this) = (
                pool.config.token0,
                pool.config.token1,
                pool.config.pool_address,
            );
            if amount0 > 0 {
                pool.ledger
                    .transfer(token0, this, recipient, U256::from(amount0))?;
            }
            if amount1 > 0 {
                pool.ledger
                    .transfer(token1, this, recipient, U256::from(amount1))?;
            }

            debug!(
                pool = ?this,
                ?owner,
                ?recipient,
                tick_lower,
                tick_upper,
                amount0,
                amount1,
                "collect"
            );
            pool.events.push(PoolEvent::Collect {
                owner,
                recipient,
                tick_lower,
                tick_upper,
                amount0,
                amount1,
            });
            Ok((amount0, amount1))
        })
    }
}
