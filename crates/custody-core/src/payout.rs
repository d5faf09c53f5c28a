//! The outward leg of a withdrawal.
//!
//! A [`Payout`] moves native value out of custody after the ledger has
//! already debited the account. It receives the ledger mutably, so an
//! implementation can call back into it; any such call sees the debited
//! balance.

use thiserror::Error;

use crate::{ledger::Ledger, Address, Amount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PayoutError {
    pub reason: String,
}

impl PayoutError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub trait Payout {
    fn pay_out(&mut self, ledger: &mut Ledger, to: &Address, amount: Amount)
        -> Result<(), PayoutError>;
}

impl<F> Payout for F
where
    F: FnMut(&mut Ledger, &Address, Amount) -> Result<(), PayoutError>,
{
    fn pay_out(
        &mut self,
        ledger: &mut Ledger,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PayoutError> {
        self(ledger, to, amount)
    }
}

/// Collects payouts in memory instead of moving value anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordedPayouts {
    pub transfers: Vec<(Address, Amount)>,
}

impl RecordedPayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Amount {
        self.transfers.iter().map(|(_, amount)| amount).sum()
    }
}

impl Payout for RecordedPayouts {
    fn pay_out(
        &mut self,
        _ledger: &mut Ledger,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PayoutError> {
        self.transfers.push((to.clone(), amount));
        Ok(())
    }
}
