//! Construction parameters for a single pool instance.

use crate::error::PoolError;
use crate::pool::tick::tick_spacing_to_max_liquidity_per_tick;
use alloy_primitives::{Address, U160};
use serde::{Deserialize, Serialize};

/// Fees are expressed in hundredths of a basis point; `1_000_000` is 100%.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Largest tick spacing accepted, so that `max_liquidity_per_tick`
/// never divides by a single tick.
pub const MAX_TICK_SPACING: i32 = 16_384;

/// Immutable parameters of a concentrated‑liquidity pool.
///
/// The registry that maps a tick spacing to its fee tier lives outside
/// this crate; a pool simply receives both values already decided.
///
/// # Validation
///
/// - `token0` and `token1` must be distinct, non‑zero and sorted
///   (`token0 < token1` by numeric address, enforced by [`PoolConfig::new`]).
/// - `fee_pips` must be below [`FEE_DENOMINATOR`].
/// - `tick_spacing` must lie in `1..MAX_TICK_SPACING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee_pips: u32,
    pub tick_spacing: i32,
}

/// Converts an `Address` into its `U160` numeric representation.
#[inline(always)]
pub fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Returns the token pair sorted by numeric address.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if address_to_u160(token_a) < address_to_u160(token_b) {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

impl PoolConfig {
    /// Creates a validated config, sorting the token pair.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if any rule listed on [`PoolConfig`] is broken.
    pub fn new(
        pool_address: Address,
        token_a: Address,
        token_b: Address,
        fee_pips: u32,
        tick_spacing: i32,
    ) -> Result<Self, PoolError> {
        let (token0, token1) = sort_tokens(token_a, token_b);
        let config = Self {
            pool_address,
            token0,
            token1,
            fee_pips,
            tick_spacing,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.token0 == self.token1 {
            return Err(PoolError::InvalidConfig("token0 and token1 must differ"));
        }
        if self.token0 == Address::ZERO || self.token1 == Address::ZERO {
            return Err(PoolError::InvalidConfig("tokens must be non-zero addresses"));
        }
        if address_to_u160(self.token0) > address_to_u160(self.token1) {
            return Err(PoolError::InvalidConfig("token0 must sort before token1"));
        }
        if self.fee_pips >= FEE_DENOMINATOR {
            return Err(PoolError::InvalidConfig("fee must be below 1_000_000 pips"));
        }
        if self.tick_spacing <= 0 || self.tick_spacing >= MAX_TICK_SPACING {
            return Err(PoolError::InvalidConfig(
                "tick spacing must be in 1..16384",
            ));
        }
        Ok(())
    }

    /// Liquidity cap for any single tick under this spacing.
    #[must_use]
    pub fn max_liquidity_per_tick(&self) -> u128 {
        tick_spacing_to_max_liquidity_per_tick(self.tick_spacing)
    }
}
