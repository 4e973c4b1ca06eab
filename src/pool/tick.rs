//! Per‑tick liquidity and "outside" accumulators.
//!
//! Each initialized tick remembers how much fee growth, tick time and
//! seconds‑per‑liquidity accrued on the side of it that is currently
//! *outside* the active price. Crossing the tick flips that side, which
//! lets any range derive its inside growth from two boundary reads.

use crate::error::{Error, PoolError};
use crate::journal::{Journaled, JournaledMap};
use crate::math::liquidity_math::add_delta;
use crate::math::tick_math::{max_usable_tick, min_usable_tick};
use crate::pool::oracle::wrapping_sub_160;
use alloy_primitives::U256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total liquidity of all positions using this tick as a boundary.
    pub liquidity_gross: u128,
    /// Liquidity added when the price crosses this tick left to right.
    pub liquidity_net: i128,
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
    pub tick_cumulative_outside: i64,
    pub seconds_per_liquidity_outside_x128: U256,
    pub seconds_outside: u32,
    pub initialized: bool,
}

/// Global accumulator values at the moment a tick is touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalAccumulators {
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub tick_cumulative: i64,
    pub time: u32,
}

/// Largest `liquidity_gross` any tick may hold so that the sum over all
/// usable ticks still fits in a `u128`.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = min_usable_tick(tick_spacing);
    let max_tick = max_usable_tick(tick_spacing);
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

impl TickInfo {
    /// Applies `liquidity_delta` to this tick and returns whether it
    /// flipped between initialized and uninitialized.
    ///
    /// A tick initialized at or below `tick_current` assumes all growth so
    /// far happened below it; above the current tick, outside growth starts
    /// at zero. Nothing is written when an error is returned.
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        globals: &GlobalAccumulators,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool, Error> {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after =
            add_delta(liquidity_gross_before, liquidity_delta).map_err(|_| {
                if liquidity_delta < 0 {
                    PoolError::InsufficientLiquidity
                } else {
                    PoolError::LiquidityOverflow
                }
            })?;
        if liquidity_gross_after > max_liquidity {
            return Err(PoolError::LiquidityOverflow.into());
        }

        let liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(PoolError::LiquidityOverflow)?;

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        if liquidity_gross_before == 0 {
            if tick <= tick_current {
                self.fee_growth_outside0_x128 = globals.fee_growth_global0_x128;
                self.fee_growth_outside1_x128 = globals.fee_growth_global1_x128;
                self.seconds_per_liquidity_outside_x128 =
                    globals.seconds_per_liquidity_cumulative_x128;
                self.tick_cumulative_outside = globals.tick_cumulative;
                self.seconds_outside = globals.time;
            }
            self.initialized = true;
        }

        self.liquidity_gross = liquidity_gross_after;
        self.liquidity_net = liquidity_net;

        Ok(flipped)
    }

    /// Flips every outside accumulator to `global - outside` and returns the
    /// liquidity to add when crossing left to right.
    pub fn cross(&mut self, globals: &GlobalAccumulators) -> i128 {
        self.fee_growth_outside0_x128 = globals
            .fee_growth_global0_x128
            .wrapping_sub(self.fee_growth_outside0_x128);
        self.fee_growth_outside1_x128 = globals
            .fee_growth_global1_x128
            .wrapping_sub(self.fee_growth_outside1_x128);
        self.seconds_per_liquidity_outside_x128 = wrapping_sub_160(
            globals.seconds_per_liquidity_cumulative_x128,
            self.seconds_per_liquidity_outside_x128,
        );
        self.tick_cumulative_outside = globals
            .tick_cumulative
            .wrapping_sub(self.tick_cumulative_outside);
        self.seconds_outside = globals.time.wrapping_sub(self.seconds_outside);
        self.liquidity_net
    }
}

/// Fee growth per unit of liquidity accrued strictly inside
/// `[tick_lower, tick_upper)`, modulo 2^256.
pub fn fee_growth_inside(
    lower: &TickInfo,
    upper: &TickInfo,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global0_x128: U256,
    fee_growth_global1_x128: U256,
) -> (U256, U256) {
    let (below0, below1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside0_x128, lower.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(lower.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(lower.fee_growth_outside1_x128),
        )
    };

    let (above0, above1) = if tick_current < tick_upper {
        (upper.fee_growth_outside0_x128, upper.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(upper.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(upper.fee_growth_outside1_x128),
        )
    };

    (
        fee_growth_global0_x128
            .wrapping_sub(below0)
            .wrapping_sub(above0),
        fee_growth_global1_x128
            .wrapping_sub(below1)
            .wrapping_sub(above1),
    )
}

/// Sparse tick ledger keyed by tick index. Absent ticks read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickTable {
    ticks: JournaledMap<i32, TickInfo>,
}

impl TickTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the tick state, zeroed if the tick was never initialized.
    #[inline]
    pub fn get(&self, tick: i32) -> TickInfo {
        self.ticks.get(&tick).copied().unwrap_or_default()
    }

    #[inline]
    pub fn is_initialized(&self, tick: i32) -> bool {
        self.ticks.get(&tick).is_some_and(|info| info.initialized)
    }

    /// See [`TickInfo::update`].
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        globals: &GlobalAccumulators,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool, Error> {
        let mut info = self.get(tick);
        let flipped = info.update(
            tick,
            tick_current,
            liquidity_delta,
            globals,
            upper,
            max_liquidity,
        )?;
        self.ticks.insert(tick, info);
        Ok(flipped)
    }

    /// Drops a tick whose gross liquidity returned to zero.
    pub fn clear(&mut self, tick: i32) {
        self.ticks.remove(&tick);
    }

    /// See [`TickInfo::cross`]. Crossing a tick that was never initialized
    /// is a no‑op returning zero.
    pub fn cross(&mut self, tick: i32, globals: &GlobalAccumulators) -> i128 {
        let Some(mut info) = self.ticks.get(&tick).copied() else {
            return 0;
        };
        let liquidity_net = info.cross(globals);
        self.ticks.insert(tick, info);
        liquidity_net
    }

    /// See [`fee_growth_inside`].
    pub fn fee_growth_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        tick_current: i32,
        fee_growth_global0_x128: U256,
        fee_growth_global1_x128: U256,
    ) -> (U256, U256) {
        fee_growth_inside(
            &self.get(tick_lower),
            &self.get(tick_upper),
            tick_lower,
            tick_upper,
            tick_current,
            fee_growth_global0_x128,
            fee_growth_global1_x128,
        )
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i32, &TickInfo)> {
        self.ticks.iter()
    }
}

impl Journaled for TickTable {
    fn begin(&mut self) {
        self.ticks.begin();
    }

    fn commit(&mut self) {
        self.ticks.commit();
    }

    fn rollback(&mut self) {
        self.ticks.rollback();
    }
}
