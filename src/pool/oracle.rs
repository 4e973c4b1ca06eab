//! Time‑weighted oracle kept as a growable ring buffer of cumulative
//! observations.
//!
//! The buffer itself does not know where its head is; the pool keeps
//! `index`, `cardinality` and `cardinality_next` in its slot0 and passes
//! them in. Timestamps are `u32` seconds and may wrap: every comparison is
//! made relative to the current time, assuming no stored observation is
//! more than `2^32` seconds old.

use crate::error::{Error, PoolError};
use crate::journal::{Journaled, JournaledMap};
use crate::U160_MAX;
use alloy_primitives::U256;

/// `a - b` modulo 2^160, the width of seconds‑per‑liquidity accumulators.
#[inline]
pub fn wrapping_sub_160(a: U256, b: U256) -> U256 {
    a.wrapping_sub(b) & U160_MAX
}

/// `a + b` modulo 2^160.
#[inline]
pub fn wrapping_add_160(a: U256, b: U256) -> U256 {
    a.wrapping_add(b) & U160_MAX
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    pub block_timestamp: u32,
    /// Sum of `tick * elapsed` since initialization, wrapping.
    pub tick_cumulative: i64,
    /// Sum of `elapsed << 128 / liquidity`, 160‑bit wrapping.
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub initialized: bool,
}

impl Observation {
    /// Extrapolates `self` forward to `block_timestamp` assuming `tick` and
    /// `liquidity` held for the whole interval. Seconds per liquidity does
    /// not advance while liquidity is zero.
    pub fn transform(&self, block_timestamp: u32, tick: i32, liquidity: u128) -> Observation {
        let delta = block_timestamp.wrapping_sub(self.block_timestamp);
        let seconds_per_liquidity = if liquidity == 0 {
            self.seconds_per_liquidity_cumulative_x128
        } else {
            let growth = (U256::from(delta) << 128) / U256::from(liquidity);
            wrapping_add_160(self.seconds_per_liquidity_cumulative_x128, growth)
        };
        Observation {
            block_timestamp,
            tick_cumulative: self
                .tick_cumulative
                .wrapping_add(i64::from(tick).wrapping_mul(i64::from(delta))),
            seconds_per_liquidity_cumulative_x128: seconds_per_liquidity,
            initialized: true,
        }
    }
}

/// `a <= b` for two timestamps at or before `time`, accounting for one
/// wrap of the `u32` clock.
#[inline]
fn lte(time: u32, a: u32, b: u32) -> bool {
    if a <= time && b <= time {
        return a <= b;
    }
    let adjust = |x: u32| {
        if x > time {
            u64::from(x)
        } else {
            u64::from(x) + (1u64 << 32)
        }
    };
    adjust(a) <= adjust(b)
}

/// Ring buffer of observations. Slots never written read as the default,
/// uninitialized observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Oracle {
    observations: JournaledMap<u16, Observation>,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, index: u16) -> Observation {
        self.observations.get(&index).copied().unwrap_or_default()
    }

    /// Writes the first observation. Returns `(cardinality, cardinality_next)`.
    pub fn initialize(&mut self, time: u32) -> (u16, u16) {
        self.observations.insert(
            0,
            Observation {
                block_timestamp: time,
                tick_cumulative: 0,
                seconds_per_liquidity_cumulative_x128: U256::ZERO,
                initialized: true,
            },
        );
        (1, 1)
    }

    /// Records the state that held since the last observation. At most one
    /// observation is written per timestamp; the buffer grows into
    /// pre‑allocated slots only once the head reaches the end.
    ///
    /// Returns the new `(index, cardinality)`.
    pub fn write(
        &mut self,
        index: u16,
        block_timestamp: u32,
        tick: i32,
        liquidity: u128,
        cardinality: u16,
        cardinality_next: u16,
    ) -> (u16, u16) {
        let last = self.get(index);
        if last.block_timestamp == block_timestamp {
            return (index, cardinality);
        }

        let cardinality_updated =
            if cardinality_next > cardinality && index == cardinality.wrapping_sub(1) {
                cardinality_next
            } else {
                cardinality
            };
        let index_updated = ((u32::from(index) + 1) % u32::from(cardinality_updated)) as u16;
        self.observations.insert(
            index_updated,
            last.transform(block_timestamp, tick, liquidity),
        );
        (index_updated, cardinality_updated)
    }

    /// Pre‑allocates slots `[current, next)` so later writes pay no
    /// allocation cost. Returns the new `cardinality_next`.
    pub fn grow(&mut self, current: u16, next: u16) -> Result<u16, Error> {
        if current == 0 {
            return Err(PoolError::NotInitialized.into());
        }
        if next <= current {
            return Ok(current);
        }
        for i in current..next {
            // non‑zero timestamp marks the slot as allocated without
            // making it a valid observation
            self.observations.insert(
                i,
                Observation {
                    block_timestamp: 1,
                    ..Observation::default()
                },
            );
        }
        Ok(next)
    }

    /// Finds the observations either side of `target`, which must lie
    /// strictly between the oldest and newest stored observations.
    fn binary_search(
        &self,
        time: u32,
        target: u32,
        index: u16,
        cardinality: u16,
    ) -> Result<(Observation, Observation), Error> {
        let cardinality = u32::from(cardinality);
        let mut l = (u32::from(index) + 1) % cardinality;
        let mut r = l + cardinality - 1;

        while l <= r {
            let i = (l + r) / 2;
            let before_or_at = self.get((i % cardinality) as u16);

            if !before_or_at.initialized {
                l = i + 1;
                continue;
            }

            let at_or_after = self.get(((i + 1) % cardinality) as u16);
            let target_at_or_after = lte(time, before_or_at.block_timestamp, target);

            if target_at_or_after && lte(time, target, at_or_after.block_timestamp) {
                return Ok((before_or_at, at_or_after));
            }

            if !target_at_or_after {
                r = match i.checked_sub(1) {
                    Some(r) => r,
                    None => break,
                };
            } else {
                l = i + 1;
            }
        }
        Err(PoolError::ObservationNotAvailable.into())
    }

    fn surrounding_observations(
        &self,
        time: u32,
        target: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Observation, Observation), Error> {
        let newest = self.get(index);

        if lte(time, newest.block_timestamp, target) {
            if newest.block_timestamp == target {
                return Ok((newest, Observation::default()));
            }
            return Ok((newest, newest.transform(target, tick, liquidity)));
        }

        let mut oldest = self.get(((u32::from(index) + 1) % u32::from(cardinality)) as u16);
        if !oldest.initialized {
            oldest = self.get(0);
        }

        if !lte(time, oldest.block_timestamp, target) {
            return Err(PoolError::ObservationNotAvailable.into());
        }

        self.binary_search(time, target, index, cardinality)
    }

    /// Cumulative values as of `seconds_ago` before `time`.
    ///
    /// `tick` and `liquidity` describe the live state since the newest
    /// observation and are used to extrapolate past it.
    pub fn observe_single(
        &self,
        time: u32,
        seconds_ago: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(i64, U256), Error> {
        if seconds_ago == 0 {
            let mut last = self.get(index);
            if last.block_timestamp != time {
                last = last.transform(time, tick, liquidity);
            }
            return Ok((
                last.tick_cumulative,
                last.seconds_per_liquidity_cumulative_x128,
            ));
        }

        let target = time.wrapping_sub(seconds_ago);
        let (before_or_at, at_or_after) =
            self.surrounding_observations(time, target, tick, index, liquidity, cardinality)?;

        if target == before_or_at.block_timestamp {
            Ok((
                before_or_at.tick_cumulative,
                before_or_at.seconds_per_liquidity_cumulative_x128,
            ))
        } else if target == at_or_after.block_timestamp {
            Ok((
                at_or_after.tick_cumulative,
                at_or_after.seconds_per_liquidity_cumulative_x128,
            ))
        } else {
            let observation_time_delta = at_or_after
                .block_timestamp
                .wrapping_sub(before_or_at.block_timestamp);
            let target_delta = target.wrapping_sub(before_or_at.block_timestamp);

            let tick_cumulative = before_or_at.tick_cumulative.wrapping_add(
                at_or_after
                    .tick_cumulative
                    .wrapping_sub(before_or_at.tick_cumulative)
                    / i64::from(observation_time_delta)
                    * i64::from(target_delta),
            );
            let spl_delta = wrapping_sub_160(
                at_or_after.seconds_per_liquidity_cumulative_x128,
                before_or_at.seconds_per_liquidity_cumulative_x128,
            );
            let seconds_per_liquidity = wrapping_add_160(
                before_or_at.seconds_per_liquidity_cumulative_x128,
                spl_delta * U256::from(target_delta) / U256::from(observation_time_delta),
            );
            Ok((tick_cumulative, seconds_per_liquidity))
        }
    }

    /// [`Oracle::observe_single`] for each entry of `seconds_agos`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotInitialized`] if no observation was ever written.
    /// - [`PoolError::ObservationNotAvailable`] if a target predates the
    ///   oldest stored observation.
    pub fn observe(
        &self,
        time: u32,
        seconds_agos: &[u32],
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Vec<i64>, Vec<U256>), Error> {
        if cardinality == 0 {
            return Err(PoolError::NotInitialized.into());
        }

        let mut tick_cumulatives = Vec::with_capacity(seconds_agos.len());
        let mut seconds_per_liquidity_cumulatives = Vec::with_capacity(seconds_agos.len());
        for &seconds_ago in seconds_agos {
            let (tick_cumulative, seconds_per_liquidity) =
                self.observe_single(time, seconds_ago, tick, index, liquidity, cardinality)?;
            tick_cumulatives.push(tick_cumulative);
            seconds_per_liquidity_cumulatives.push(seconds_per_liquidity);
        }
        Ok((tick_cumulatives, seconds_per_liquidity_cumulatives))
    }
}

impl Journaled for Oracle {
    fn begin(&mut self) {
        self.observations.begin();
    }

    fn commit(&mut self) {
        self.observations.commit();
    }

    fn rollback(&mut self) {
        self.observations.rollback();
    }
}
