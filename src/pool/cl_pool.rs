//! Pool state, the reentrancy lock and read‑only queries.
//!
//! Every mutating entry point runs through [`ClPool::guarded`]: it takes the
//! lock, opens a journal on each ledger and checkpoints the asset ledger.
//! If the operation fails, ticks, bitmap, positions, observations, the
//! scalar state, balances and pending events are all restored to what they
//! were on entry. The lock is released on every exit path.

use crate::config::PoolConfig;
use crate::error::{Error, PoolError, PriceError};
use crate::journal::Journaled;
use crate::math::tick_bitmap::TickBitmap;
use crate::math::tick_math::{tick_at_sqrt_price, MAX_TICK, MIN_TICK};
use crate::pool::clock::Clock;
use crate::pool::event::PoolEvent;
use crate::pool::ledger::AssetLedger;
use crate::pool::oracle::{wrapping_sub_160, Observation, Oracle};
use crate::pool::position::{PositionInfo, PositionKey, PositionTable};
use crate::pool::tick::{GlobalAccumulators, TickInfo, TickTable};
use alloy_primitives::{Address, U256};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot0 {
    /// Current price as a Q64.96 square root; zero until initialized.
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Most recently written observation.
    pub observation_index: u16,
    /// Observations currently in use.
    pub observation_cardinality: u16,
    /// Observations allocated, used once the head wraps.
    pub observation_cardinality_next: u16,
    pub unlocked: bool,
}

/// Accumulated tick, seconds‑per‑liquidity and seconds spent inside a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CumulativesInside {
    pub tick_cumulative_inside: i64,
    pub seconds_per_liquidity_inside_x128: U256,
    pub seconds_inside: u32,
}

/// Values restored when a guarded operation fails.
struct Snapshot {
    slot0: Slot0,
    liquidity: u128,
    fee_growth_global0_x128: U256,
    fee_growth_global1_x128: U256,
    ledger_checkpoint: usize,
    event_count: usize,
}

/// A single concentrated‑liquidity pool.
///
/// The pool owns its ledgers and is driven through `&mut self`; callbacks
/// receive the same `&mut` borrow, so re‑entry is detected by the lock
/// rather than prevented by the borrow checker.
#[derive(Debug, Clone)]
pub struct ClPool<L, C> {
    pub(crate) config: PoolConfig,
    pub(crate) max_liquidity_per_tick: u128,
    pub(crate) slot0: Slot0,
    pub(crate) liquidity: u128,
    pub(crate) fee_growth_global0_x128: U256,
    pub(crate) fee_growth_global1_x128: U256,
    pub(crate) ticks: TickTable,
    pub(crate) tick_bitmap: TickBitmap,
    pub(crate) positions: PositionTable,
    pub(crate) oracle: Oracle,
    pub(crate) ledger: L,
    pub(crate) clock: C,
    pub(crate) events: Vec<PoolEvent>,
}

impl<L: AssetLedger, C: Clock> ClPool<L, C> {
    /// Creates an uninitialized pool.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: PoolConfig, ledger: L, clock: C) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            max_liquidity_per_tick: config.max_liquidity_per_tick(),
            config,
            slot0: Slot0::default(),
            liquidity: 0,
            fee_growth_global0_x128: U256::ZERO,
            fee_growth_global1_x128: U256::ZERO,
            ticks: TickTable::new(),
            tick_bitmap: TickBitmap::new(),
            positions: PositionTable::new(),
            oracle: Oracle::new(),
            ledger,
            clock,
            events: Vec::new(),
        })
    }

    /// Sets the starting price and writes the first observation.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyInitialized`] on a second call.
    /// - [`PoolError::PriceOutOfBounds`] unless
    ///   `MIN_SQRT_RATIO <= sqrt_price_x96 < MAX_SQRT_RATIO`.
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<(), Error> {
        if self.is_initialized() {
            return Err(PoolError::AlreadyInitialized.into());
        }
        let tick = tick_at_sqrt_price(sqrt_price_x96).map_err(|e| match e {
            PriceError::SqrtPriceOutOfRange => Error::from(PoolError::PriceOutOfBounds),
            other => Error::from(other),
        })?;

        let (cardinality, cardinality_next) = self.oracle.initialize(self.clock.now());
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            observation_index: 0,
            observation_cardinality: cardinality,
            observation_cardinality_next: cardinality_next,
            unlocked: true,
        };

        debug!(pool = ?self.config.pool_address, ?sqrt_price_x96, tick, "pool initialized");
        self.events.push(PoolEvent::Initialize {
            sqrt_price_x96,
            tick,
        });
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        !self.slot0.sqrt_price_x96.is_zero()
    }

    /// Runs `op` holding the lock, rolling every ledger back if it fails.
    pub(crate) fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized.into());
        }
        if !self.slot0.unlocked {
            return Err(PoolError::Locked.into());
        }
        self.slot0.unlocked = false;

        let snapshot = self.begin();
        let result = op(self);
        match result {
            Ok(_) => self.commit(&snapshot),
            Err(ref err) => {
                debug!(pool = ?self.config.pool_address, %err, "operation reverted");
                self.rollback(&snapshot);
            }
        }

        self.slot0.unlocked = true;
        result
    }

    fn begin(&mut self) -> Snapshot {
        self.ticks.begin();
        self.tick_bitmap.begin();
        self.positions.begin();
        self.oracle.begin();
        Snapshot {
            slot0: self.slot0,
            liquidity: self.liquidity,
            fee_growth_global0_x128: self.fee_growth_global0_x128,
            fee_growth_global1_x128: self.fee_growth_global1_x128,
            ledger_checkpoint: self.ledger.checkpoint(),
            event_count: self.events.len(),
        }
    }

    fn commit(&mut self, snapshot: &Snapshot) {
        self.ticks.commit();
        self.tick_bitmap.commit();
        self.positions.commit();
        self.oracle.commit();
        self.ledger.commit(snapshot.ledger_checkpoint);
    }

    fn rollback(&mut self, snapshot: &Snapshot) {
        self.ticks.rollback();
        self.tick_bitmap.rollback();
        self.positions.rollback();
        self.oracle.rollback();
        self.ledger.revert_to(snapshot.ledger_checkpoint);
        self.slot0 = snapshot.slot0;
        self.liquidity = snapshot.liquidity;
        self.fee_growth_global0_x128 = snapshot.fee_growth_global0_x128;
        self.fee_growth_global1_x128 = snapshot.fee_growth_global1_x128;
        self.events.truncate(snapshot.event_count);
    }

    /// Validates a position range: ordered, inside the tick domain and
    /// aligned to the tick spacing.
    pub(crate) fn check_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), Error> {
        let spacing = self.config.tick_spacing;
        if tick_lower >= tick_upper
            || tick_lower < MIN_TICK
            || tick_upper > MAX_TICK
            || tick_lower % spacing != 0
            || tick_upper % spacing != 0
        {
            return Err(PoolError::InvalidRange {
                tick_lower,
                tick_upper,
            }
            .into());
        }
        Ok(())
    }

    /// Global accumulators as of `time`, extrapolating the oracle with the
    /// live tick and liquidity.
    pub(crate) fn global_accumulators(&self, time: u32) -> Result<GlobalAccumulators, Error> {
        let (tick_cumulative, seconds_per_liquidity_cumulative_x128) = self.oracle.observe_single(
            time,
            0,
            self.slot0.tick,
            self.slot0.observation_index,
            self.liquidity,
            self.slot0.observation_cardinality,
        )?;
        Ok(GlobalAccumulators {
            fee_growth_global0_x128: self.fee_growth_global0_x128,
            fee_growth_global1_x128: self.fee_growth_global1_x128,
            seconds_per_liquidity_cumulative_x128,
            tick_cumulative,
            time,
        })
    }

    /// Records the state that held up to `time` in the oracle.
    pub(crate) fn write_observation(&mut self, time: u32, tick: i32, liquidity: u128) {
        let (index, cardinality) = self.oracle.write(
            self.slot0.observation_index,
            time,
            tick,
            liquidity,
            self.slot0.observation_cardinality,
            self.slot0.observation_cardinality_next,
        );
        self.slot0.observation_index = index;
        self.slot0.observation_cardinality = cardinality;
    }

    /// Pre‑allocates oracle slots so up to `observation_cardinality_next`
    /// observations are retained. Never shrinks.
    pub fn increase_observation_cardinality_next(
        &mut self,
        observation_cardinality_next: u16,
    ) -> Result<(), Error> {
        self.guarded(|pool| {
            let old = pool.slot0.observation_cardinality_next;
            let new = pool.oracle.grow(old, observation_cardinality_next)?;
            pool.slot0.observation_cardinality_next = new;
            if old != new {
                debug!(pool = ?pool.config.pool_address, old, new, "observation cardinality grown");
                pool.events
                    .push(PoolEvent::IncreaseObservationCardinalityNext {
                        observation_cardinality_next_old: old,
                        observation_cardinality_next_new: new,
                    });
            }
            Ok(())
        })
    }

    /// Tick and seconds‑per‑liquidity cumulatives for each `seconds_ago`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotInitialized`] before [`ClPool::initialize`].
    /// - [`PoolError::ObservationNotAvailable`] for targets older than the
    ///   oldest retained observation.
    pub fn observe(&self, seconds_agos: &[u32]) -> Result<(Vec<i64>, Vec<U256>), Error> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized.into());
        }
        self.oracle.observe(
            self.clock.now(),
            seconds_agos,
            self.slot0.tick,
            self.slot0.observation_index,
            self.liquidity,
            self.slot0.observation_cardinality,
        )
    }

    /// Cumulatives accrued while the price was inside `[tick_lower, tick_upper)`.
    ///
    /// Only differences between two snapshots of the same range are
    /// meaningful; the absolute values depend on when the boundary ticks
    /// were initialized.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotInitialized`] before [`ClPool::initialize`].
    /// - [`PoolError::InvalidRange`] for a malformed range.
    /// - [`PoolError::TickNotInitialized`] if a boundary holds no liquidity.
    pub fn snapshot_cumulatives_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<CumulativesInside, Error> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized.into());
        }
        self.check_ticks(tick_lower, tick_upper)?;

        let lower = self.ticks.get(tick_lower);
        let upper = self.ticks.get(tick_upper);
        if !lower.initialized {
            return Err(PoolError::TickNotInitialized(tick_lower).into());
        }
        if !upper.initialized {
            return Err(PoolError::TickNotInitialized(tick_upper).into());
        }

        let tick = self.slot0.tick;
        let inside = if tick < tick_lower {
            CumulativesInside {
                tick_cumulative_inside: lower
                    .tick_cumulative_outside
                    .wrapping_sub(upper.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: wrapping_sub_160(
                    lower.seconds_per_liquidity_outside_x128,
                    upper.seconds_per_liquidity_outside_x128,
                ),
                seconds_inside: lower.seconds_outside.wrapping_sub(upper.seconds_outside),
            }
        } else if tick < tick_upper {
            let globals = self.global_accumulators(self.clock.now())?;
            CumulativesInside {
                tick_cumulative_inside: globals
                    .tick_cumulative
                    .wrapping_sub(lower.tick_cumulative_outside)
                    .wrapping_sub(upper.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: wrapping_sub_160(
                    wrapping_sub_160(
                        globals.seconds_per_liquidity_cumulative_x128,
                        lower.seconds_per_liquidity_outside_x128,
                    ),
                    upper.seconds_per_liquidity_outside_x128,
                ),
                seconds_inside: globals
                    .time
                    .wrapping_sub(lower.seconds_outside)
                    .wrapping_sub(upper.seconds_outside),
            }
        } else {
            CumulativesInside {
                tick_cumulative_inside: upper
                    .tick_cumulative_outside
                    .wrapping_sub(lower.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: wrapping_sub_160(
                    upper.seconds_per_liquidity_outside_x128,
                    lower.seconds_per_liquidity_outside_x128,
                ),
                seconds_inside: upper.seconds_outside.wrapping_sub(lower.seconds_outside),
            }
        };
        Ok(inside)
    }

    /// Pool's own balance of token0 on the ledger.
    pub fn balance0(&self) -> U256 {
        self.ledger
            .balance_of(self.config.token0, self.config.pool_address)
    }

    /// Pool's own balance of token1 on the ledger.
    pub fn balance1(&self) -> U256 {
        self.ledger
            .balance_of(self.config.token1, self.config.pool_address)
    }
}

impl<L, C> ClPool<L, C> {
    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[inline]
    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    #[inline]
    pub fn slot0(&self) -> Slot0 {
        self.slot0
    }

    /// Liquidity active at the current tick.
    #[inline]
    pub fn liquidity(&self) -> u128 {
        self.liquidity
    }

    #[inline]
    pub fn fee_growth_global0_x128(&self) -> U256 {
        self.fee_growth_global0_x128
    }

    #[inline]
    pub fn fee_growth_global1_x128(&self) -> U256 {
        self.fee_growth_global1_x128
    }

    pub fn tick(&self, tick: i32) -> TickInfo {
        self.ticks.get(tick)
    }

    pub fn ticks(&self) -> &TickTable {
        &self.ticks
    }

    pub fn tick_bitmap_word(&self, word_pos: i16) -> U256 {
        self.tick_bitmap.word(word_pos)
    }

    pub fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> PositionInfo {
        self.positions
            .get(&PositionKey::new(owner, tick_lower, tick_upper))
    }

    pub fn observation(&self, index: u16) -> Observation {
        self.oracle.get(index)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable ledger access, used by callbacks to pay the pool.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Drains events of committed operations, oldest first.
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl<L, C> ClPool<L, C> {
    pub fn set_fee_growth_global0_x128(&mut self, value: U256) {
        self.fee_growth_global0_x128 = value;
    }

    pub fn set_fee_growth_global1_x128(&mut self, value: U256) {
        self.fee_growth_global1_x128 = value;
    }
}
