//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use clmm_pool_engine::{
    error::Error,
    pool::{
        AssetLedger, Clock, FlashCallback, InMemoryLedger, ManualClock, MintCallback,
        SwapCallback,
    },
    Address, ClPool, PoolConfig, I256, U256,
};
use std::sync::Once;

pub const TOKEN0: Address = Address::with_last_byte(0x10);
pub const TOKEN1: Address = Address::with_last_byte(0x20);
pub const POOL: Address = Address::with_last_byte(0xee);
pub const ALICE: Address = Address::with_last_byte(0xa1);
pub const BOB: Address = Address::with_last_byte(0xb0);
pub const CAROL: Address = Address::with_last_byte(0xc4);

pub const START_TIME: u32 = 1_601_906_400;

pub type TestPool = ClPool<InMemoryLedger, ManualClock>;

static INIT: Once = Once::new();

/// Installs a test writer subscriber once; `RUST_LOG` overrides the filter.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clmm_pool_engine=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn e18(n: u128) -> u128 {
    n * 1_000_000_000_000_000_000
}

/// `sqrt(reserve1 / reserve0)` as Q64.96.
pub fn encode_price_sqrt(reserve1: u128, reserve0: u128) -> U256 {
    ((U256::from(reserve1) << 192usize) / U256::from(reserve0)).root(2)
}

/// Pool with funded accounts for `ALICE`, `BOB` and `CAROL`.
pub fn funded_pool(fee_pips: u32, tick_spacing: i32, sqrt_price_x96: U256) -> TestPool {
    init_test_tracing();
    let config = PoolConfig::new(POOL, TOKEN1, TOKEN0, fee_pips, tick_spacing).unwrap();
    let mut ledger = InMemoryLedger::new();
    for owner in [ALICE, BOB, CAROL] {
        ledger.fund(TOKEN0, owner, U256::from(e18(1_000_000)));
        ledger.fund(TOKEN1, owner, U256::from(e18(1_000_000)));
    }
    let mut pool = ClPool::new(config, ledger, ManualClock::new(START_TIME)).unwrap();
    pool.initialize(sqrt_price_x96).unwrap();
    pool
}

/// Pays exactly what the pool asks for out of `from`'s balance.
#[derive(Debug, Clone, Copy)]
pub struct Payer {
    pub from: Address,
    /// Flash repayments, principal included.
    pub repay: (U256, U256),
}

impl Payer {
    pub fn new(from: Address) -> Self {
        Self {
            from,
            repay: (U256::ZERO, U256::ZERO),
        }
    }

    fn pay<L: AssetLedger, C: Clock>(
        &self,
        pool: &mut ClPool<L, C>,
        token: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let to = pool.config().pool_address;
        pool.ledger_mut().transfer(token, self.from, to, amount)
    }
}

impl<L: AssetLedger, C: Clock> MintCallback<L, C> for Payer {
    fn mint_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_owed: U256,
        amount1_owed: U256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.config().token0, pool.config().token1);
        self.pay(pool, token0, amount0_owed)?;
        self.pay(pool, token1, amount1_owed)
    }
}

impl<L: AssetLedger, C: Clock> SwapCallback<L, C> for Payer {
    fn swap_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_delta: I256,
        amount1_delta: I256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.config().token0, pool.config().token1);
        if amount0_delta.is_positive() {
            self.pay(pool, token0, amount0_delta.into_raw())?;
        }
        if amount1_delta.is_positive() {
            self.pay(pool, token1, amount1_delta.into_raw())?;
        }
        Ok(())
    }
}

impl<L: AssetLedger, C: Clock> FlashCallback<L, C> for Payer {
    fn flash_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        _fee0: U256,
        _fee1: U256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.config().token0, pool.config().token1);
        let (repay0, repay1) = self.repay;
        self.pay(pool, token0, repay0)?;
        self.pay(pool, token1, repay1)
    }
}

pub fn balance(pool: &TestPool, token: Address, owner: Address) -> U256 {
    pool.ledger().balance_of(token, owner)
}
