//! Payment capabilities handed to the pool by callers.
//!
//! The pool computes what it is owed and invokes the matching callback
//! with mutable access to itself. The callback pays by moving tokens into
//! the pool's account on the pool's ledger; the pool then checks the
//! balance delta instead of trusting any return value. Calling back into a
//! mutating pool method from here fails with `Locked`.

use crate::error::Error;
use crate::pool::cl_pool::ClPool;
use crate::pool::clock::Clock;
use crate::pool::ledger::AssetLedger;
use alloy_primitives::{I256, U256};

pub trait MintCallback<L: AssetLedger, C: Clock> {
    /// Must pay `amount0_owed` of token0 and `amount1_owed` of token1.
    fn mint_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error>;
}

pub trait SwapCallback<L: AssetLedger, C: Clock> {
    /// Deltas are from the pool's point of view: the positive one must be
    /// paid in, the negative one was already sent to the recipient.
    fn swap_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &[u8],
    ) -> Result<(), Error>;
}

pub trait FlashCallback<L: AssetLedger, C: Clock> {
    /// Must return the borrowed amounts plus at least `fee0` / `fee1`.
    fn flash_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        fee0: U256,
        fee1: U256,
        data: &[u8],
    ) -> Result<(), Error>;
}
