// ============================================================================
// Treasury - escrowed stake pool and payout transfers
// ============================================================================
//
// Stakes are deposited into the pool when a bet is placed and leave it only
// through a claim transfer. `Escrow` is the in-process implementation; a
// different sink (an L1 bridge, a wallet service) plugs in through the
// `Treasury` trait.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::TransferError;
use crate::types::{Amount, Identity};

pub trait Treasury {
    /// Move `amount` from `from` into the pool
    fn deposit(&mut self, from: &Identity, amount: Amount) -> Result<(), TransferError>;

    /// Pay `amount` out of the pool to `to`
    fn transfer(&mut self, to: &Identity, amount: Amount) -> Result<(), TransferError>;

    /// Funds currently held in escrow
    fn pool_balance(&self) -> Amount;
}

/// In-process escrow: a pooled balance plus the total paid out to each identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Escrow {
    pool: Amount,
    credited: BTreeMap<Identity, Amount>,
    total_deposited: Amount,
    total_paid_out: Amount,
    #[serde(default)]
    frozen: bool,
}

impl Escrow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total paid out to `identity` so far
    pub fn credited(&self, identity: &Identity) -> Amount {
        self.credited.get(identity).copied().unwrap_or(0)
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_paid_out(&self) -> Amount {
        self.total_paid_out
    }

    /// While frozen every transfer fails; deposits are still accepted
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl Treasury for Escrow {
    fn deposit(&mut self, _from: &Identity, amount: Amount) -> Result<(), TransferError> {
        self.pool = self.pool.checked_add(amount).ok_or(TransferError::PoolOverflow)?;
        self.total_deposited = self.total_deposited.saturating_add(amount);
        Ok(())
    }

    fn transfer(&mut self, to: &Identity, amount: Amount) -> Result<(), TransferError> {
        if self.frozen {
            return Err(TransferError::Frozen);
        }
        if amount > self.pool {
            return Err(TransferError::InsufficientPool {
                available: self.pool,
                requested: amount,
            });
        }

        self.pool -= amount;
        self.total_paid_out = self.total_paid_out.saturating_add(amount);
        let credited = self.credited.entry(to.clone()).or_insert(0);
        *credited = credited.saturating_add(amount);
        Ok(())
    }

    fn pool_balance(&self) -> Amount {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_then_transfer() {
        let mut escrow = Escrow::new();
        let alice = Identity::from("alice");
        let bob = Identity::from("bob");

        escrow.deposit(&alice, 100).unwrap();
        escrow.deposit(&bob, 50).unwrap();
        assert_eq!(escrow.pool_balance(), 150);

        escrow.transfer(&bob, 150).unwrap();
        assert_eq!(escrow.pool_balance(), 0);
        assert_eq!(escrow.credited(&bob), 150);
        assert_eq!(escrow.credited(&alice), 0);
        assert_eq!(escrow.total_deposited(), 150);
        assert_eq!(escrow.total_paid_out(), 150);
    }

    #[test]
    fn test_transfer_more_than_pool() {
        let mut escrow = Escrow::new();
        escrow.deposit(&Identity::from("alice"), 10).unwrap();

        let err = escrow.transfer(&Identity::from("alice"), 11).unwrap_err();
        assert_eq!(err, TransferError::InsufficientPool { available: 10, requested: 11 });
        assert_eq!(escrow.pool_balance(), 10);
    }

    #[test]
    fn test_frozen_escrow_refuses_transfers() {
        let mut escrow = Escrow::new();
        let alice = Identity::from("alice");
        escrow.deposit(&alice, 10).unwrap();
        escrow.freeze();

        assert_eq!(escrow.transfer(&alice, 5).unwrap_err(), TransferError::Frozen);
        assert_eq!(escrow.pool_balance(), 10);

        escrow.unfreeze();
        escrow.transfer(&alice, 5).unwrap();
        assert_eq!(escrow.credited(&alice), 5);
    }
}
