use crate::config::FEE_DENOMINATOR;
use crate::error::{Error, PoolError};
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::pool::callback::FlashCallback;
use crate::pool::cl_pool::ClPool;
use crate::pool::clock::Clock;
use crate::pool::event::PoolEvent;
use crate::pool::ledger::AssetLedger;
use crate::Q128;
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Amounts repaid on top of the principal by a flash loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashResult {
    pub paid0: U256,
    pub paid1: U256,
}

impl<L: AssetLedger, C: Clock> ClPool<L, C> {
    /// Lends `amount0` / `amount1` to `recipient` for the duration of the
    /// callback, which must return them plus the pool fee.
    ///
    /// Everything repaid above the principal, not just the minimum fee, is
    /// distributed to in‑range liquidity as fee growth. A zero‑amount
    /// flash is a plain donation.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroLiquidity`] if no liquidity is in range.
    /// - [`PoolError::TransferFailed`] if the pool cannot lend the amount.
    /// - [`PoolError::InsufficientInputAmount`] if the callback repays less
    ///   than principal plus fee.
    pub fn flash<CB: FlashCallback<L, C>>(
        &mut self,
        recipient: Address,
        amount0: U256,
        amount1: U256,
        callback: &mut CB,
        data: &[u8],
    ) -> Result<FlashResult, Error> {
        self.guarded(|pool| {
            let liquidity = pool.liquidity;
            if liquidity == 0 {
                return Err(PoolError::ZeroLiquidity.into());
            }

            let fee = U256::from(pool.config.fee_pips);
            let denominator = U256::from(FEE_DENOMINATOR);
            let fee0 = mul_div_rounding_up(amount0, fee, denominator)?;
            let fee1 = mul_div_rounding_up(amount1, fee, denominator)?;

            let balance0_before = pool.balance0();
            let balance1_before = pool.balance1();

            let (token0, token1, this) = (
                pool.config.token0,
                pool.config.token1,
                pool.config.pool_address,
            );
            if !amount0.is_zero() {
                pool.ledger.transfer(token0, this, recipient, amount0)?;
            }
            if !amount1.is_zero() {
                pool.ledger.transfer(token1, this, recipient, amount1)?;
            }

            callback.flash_callback(pool, fee0, fee1, data)?;

            let balance0_after = pool.balance0();
            let balance1_after = pool.balance1();
            pool.require_paid(balance0_before, fee0, balance0_after)?;
            pool.require_paid(balance1_before, fee1, balance1_after)?;

            // both checks above guarantee after >= before
            let paid0 = balance0_after - balance0_before;
            let paid1 = balance1_after - balance1_before;

            let liquidity = U256::from(liquidity);
            if !paid0.is_zero() {
                pool.fee_growth_global0_x128 = pool
                    .fee_growth_global0_x128
                    .wrapping_add(mul_div(paid0, Q128, liquidity)?);
            }
            if !paid1.is_zero() {
                pool.fee_growth_global1_x128 = pool
                    .fee_growth_global1_x128
                    .wrapping_add(mul_div(paid1, Q128, liquidity)?);
            }

            debug!(
                pool = ?this,
                ?recipient,
                ?amount0,
                ?amount1,
                ?paid0,
                ?paid1,
                "flash"
            );
            pool.events.push(PoolEvent::Flash {
                recipient,
                amount0,
                amount1,
                paid0,
                paid1,
            });
            Ok(FlashResult { paid0, paid1 })
        })
    }
}
