//! Concentrated‑liquidity pool engine in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, prices, swap steps and bitmaps.
//! - Tick, position and oracle ledgers (`pool::tick`, `pool::position`, `pool::oracle`).
//! - An owned, single‑writer `ClPool` state machine implementing
//!   initialize / mint / burn / collect / swap / flash with a reentrancy lock.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use clmm_pool_engine::{math::tick_math, RESOLUTION, U256};
//!
//! let sqrt_price = tick_math::sqrt_price_at_tick(0).unwrap();
//! assert_eq!(sqrt_price, U256::from(1u8) << RESOLUTION);
//! ```
//!
//! ## Running a pool in memory
//! ```no_run
//! use clmm_pool_engine::{
//!     pool::{InMemoryLedger, ManualClock},
//!     Address, ClPool, PoolConfig, U256,
//! };
//!
//! let token0 = Address::with_last_byte(1);
//! let token1 = Address::with_last_byte(2);
//! let config = PoolConfig::new(Address::with_last_byte(9), token0, token1, 3000, 60).unwrap();
//! let mut pool = ClPool::new(config, InMemoryLedger::default(), ManualClock::new(1_000)).unwrap();
//! pool.initialize(U256::from(1u8) << 96).unwrap();
//! assert_eq!(pool.slot0().tick, 0);
//! ```

pub use alloy_primitives::{Address, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod journal;
pub mod math;
pub mod pool;

pub use config::PoolConfig;
pub use error::Error;
pub use hash::FastMap;
pub use pool::cl_pool::ClPool;

/// `2^160 - 1`, the largest value a Q64.96 sqrt price may take.
pub const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);
const U256_E6: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
