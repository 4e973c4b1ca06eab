//! Asset custody seen from the pool.
//!
//! The pool never holds balances itself. It asks an [`AssetLedger`] to move
//! tokens out and reads balances back to verify that payment callbacks
//! actually paid.

use crate::error::{Error, PoolError};
use crate::FastMap;
use alloy_primitives::{Address, U256};

pub trait AssetLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    /// Moves `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::TransferFailed`] if `from` holds less than `amount`
    ///   or the credit would overflow.
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;

    /// Marks the current state. Every transfer after it can be undone with
    /// [`AssetLedger::revert_to`].
    fn checkpoint(&mut self) -> usize;

    /// Undoes every transfer made since `checkpoint`.
    fn revert_to(&mut self, checkpoint: usize);

    /// Keeps every transfer made since `checkpoint`.
    fn commit(&mut self, _checkpoint: usize) {}
}

type BalanceKey = (Address, Address);

/// Balances held in memory, keyed by `(token, owner)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: FastMap<BalanceKey, U256>,
    journal: Vec<(BalanceKey, U256)>,
    open_checkpoints: usize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `owner` with freshly minted `amount` of `token`.
    pub fn fund(&mut self, token: Address, owner: Address, amount: U256) {
        let balance = self.balance_of(token, owner);
        self.set((token, owner), balance.saturating_add(amount));
    }

    fn set(&mut self, key: BalanceKey, value: U256) {
        let previous = self.balances.insert(key, value).unwrap_or(U256::ZERO);
        if self.open_checkpoints > 0 {
            self.journal.push((key, previous));
        }
    }

    fn close_checkpoint(&mut self) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error> {
        let failed = || PoolError::TransferFailed { token, amount };

        let from_balance = self
            .balance_of(token, from)
            .checked_sub(amount)
            .ok_or_else(failed)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or_else(failed)?;

        self.set((token, from), from_balance);
        self.set((token, to), to_balance);
        Ok(())
    }

    fn checkpoint(&mut self) -> usize {
        self.open_checkpoints += 1;
        self.journal.len()
    }

    fn revert_to(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            if let Some((key, previous)) = self.journal.pop() {
                self.balances.insert(key, previous);
            }
        }
        self.close_checkpoint();
    }

    fn commit(&mut self, _checkpoint: usize) {
        self.close_checkpoint();
    }
}
