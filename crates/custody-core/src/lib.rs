//! Custodial balance ledger.
//!
//! The ledger holds native value on behalf of accounts and exposes four
//! operations, each taking the calling account explicitly:
//!
//! * [`Ledger::deposit`] credits the caller.
//! * [`Ledger::withdraw`] debits the caller and then pays the value out
//!   through a [`Payout`]; the debit is committed before the payout runs.
//! * [`Ledger::send_to`] moves value to another account, routing a
//!   proportional fee (see [`fee`]) to the configured fee recipient.
//! * [`Ledger::set_basis_point`] lets the operator retune the fee rate,
//!   never above [`fee::BASE`].
//!
//! Rejected calls leave the ledger untouched and return a [`LedgerError`].

pub mod access;
pub mod config;
pub mod fee;
pub mod ledger;
pub mod payout;
pub mod snapshot;
pub mod units;

mod error;

pub use error::LedgerError;
pub use fee::{compute_fee, BasisPoints, FeeQuote, BASE};
pub use ledger::{Ledger, LedgerEvent, LedgerGenesis};
pub use payout::{Payout, PayoutError, RecordedPayouts};
pub use snapshot::LedgerSnapshot;

/// Account identifier.
pub type Address = String;

/// Native value in base units.
pub type Amount = u128;
