use thiserror::Error;

use crate::{Address, Amount};

/// Every way a ledger call can be rejected.
///
/// A rejected call never leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller asked to move more than its recorded balance.
    #[error("insufficient funds in account {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: Address,
        requested: Amount,
        available: Amount,
    },

    /// A privileged call came from someone other than the operator.
    #[error("caller {caller} is not the operator")]
    Unauthorized { caller: Address },

    /// A fee rate above 100% was proposed.
    #[error("fee basis points {requested} exceed base {}", crate::fee::BASE)]
    FeeBasisPointsExceedBase { requested: u32 },

    /// A mutating call arrived while a withdrawal payout was still running.
    #[error("call from {caller} rejected: a withdrawal payout is in flight")]
    ReentrantCall { caller: Address },

    /// Accepting the deposit would make total custody unrepresentable.
    #[error("deposit of {requested} would overflow total custody")]
    CustodyOverflow { requested: Amount },

    /// The outward transfer of a withdrawal did not go through.
    #[error("payout of {amount} to {account} failed: {reason}")]
    PayoutFailed {
        account: Address,
        amount: Amount,
        reason: String,
    },

    /// A persisted snapshot does not describe a consistent ledger.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
