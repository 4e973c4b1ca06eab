use crate::error::{Error, MathError, PoolError};
use crate::journal::{Journaled, JournaledMap};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::Q128;
use alloy_primitives::{Address, U256};

/// Identifies a liquidity position: one owner, one tick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Fee growth inside the range as of the last touch.
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    /// Settled amounts the owner can collect.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

/// Fees accrued on `liquidity` while inside growth moved from `last` to
/// `current`, floored and capped at `u128::MAX`.
fn accrued_fees(current: U256, last: U256, liquidity: u128) -> Result<u128, Error> {
    let owed = mul_div(current.wrapping_sub(last), U256::from(liquidity), Q128)?;
    Ok(u128::try_from(owed).unwrap_or(u128::MAX))
}

impl PositionInfo {
    /// Settles fees accrued since the last touch, applies `liquidity_delta`
    /// and snapshots the new inside growth.
    ///
    /// Owed amounts saturate at `u128::MAX`; growth beyond the cap is
    /// discarded. Nothing is written when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NoPosition`] for a zero delta on an empty position.
    /// - [`PoolError::InsufficientLiquidity`] if the delta removes more than held.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside0_x128: U256,
        fee_growth_inside1_x128: U256,
    ) -> Result<(), Error> {
        let liquidity_next = if liquidity_delta == 0 {
            if self.liquidity == 0 {
                return Err(PoolError::NoPosition.into());
            }
            self.liquidity
        } else {
            add_delta(self.liquidity, liquidity_delta).map_err(|e| match e {
                MathError::Underflow => Error::from(PoolError::InsufficientLiquidity),
                other => Error::from(other),
            })?
        };

        let owed0 = accrued_fees(
            fee_growth_inside0_x128,
            self.fee_growth_inside0_last_x128,
            self.liquidity,
        )?;
        let owed1 = accrued_fees(
            fee_growth_inside1_x128,
            self.fee_growth_inside1_last_x128,
            self.liquidity,
        )?;

        self.liquidity = liquidity_next;
        self.fee_growth_inside0_last_x128 = fee_growth_inside0_x128;
        self.fee_growth_inside1_last_x128 = fee_growth_inside1_x128;
        self.tokens_owed0 = self.tokens_owed0.saturating_add(owed0);
        self.tokens_owed1 = self.tokens_owed1.saturating_add(owed1);
        Ok(())
    }
}

/// Position ledger keyed by [`PositionKey`]. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTable {
    positions: JournaledMap<PositionKey, PositionInfo>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the position, zeroed if it was never created.
    #[inline]
    pub fn get(&self, key: &PositionKey) -> PositionInfo {
        self.positions.get(key).copied().unwrap_or_default()
    }

    pub fn contains(&self, key: &PositionKey) -> bool {
        self.positions.contains_key(key)
    }

    /// See [`PositionInfo::update`]. Returns the updated position.
    pub fn update(
        &mut self,
        key: PositionKey,
        liquidity_delta: i128,
        fee_growth_inside0_x128: U256,
        fee_growth_inside1_x128: U256,
    ) -> Result<PositionInfo, Error> {
        let mut info = self.get(&key);
        info.update(
            liquidity_delta,
            fee_growth_inside0_x128,
            fee_growth_inside1_x128,
        )?;
        self.positions.insert(key, info);
        Ok(info)
    }

    /// Pays out up to the requested amounts from the owed balances and
    /// returns what was taken. A missing position yields zero.
    pub fn take_owed(
        &mut self,
        key: &PositionKey,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> (u128, u128) {
        let Some(mut info) = self.positions.get(key).copied() else {
            return (0, 0);
        };
        let amount0 = amount0_requested.min(info.tokens_owed0);
        let amount1 = amount1_requested.min(info.tokens_owed1);
        if amount0 == 0 && amount1 == 0 {
            return (0, 0);
        }
        info.tokens_owed0 -= amount0;
        info.tokens_owed1 -= amount1;
        self.positions.insert(*key, info);
        (amount0, amount1)
    }

    /// Credits burned principal to the owed balances.
    pub fn credit_owed(
        &mut self,
        key: &PositionKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), Error> {
        let mut info = self.get(key);
        info.tokens_owed0 = info
            .tokens_owed0
            .checked_add(amount0)
            .ok_or(MathError::Overflow)?;
        info.tokens_owed1 = info
            .tokens_owed1
            .checked_add(amount1)
            .ok_or(MathError::Overflow)?;
        self.positions.insert(*key, info);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &PositionInfo)> {
        self.positions.iter()
    }
}

impl Journaled for PositionTable {
    fn begin(&mut self) {
        self.positions.begin();
    }

    fn commit(&mut self) {
        self.positions.commit();
    }

    fn rollback(&mut self) {
        self.positions.rollback();
    }
}
