use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    access::AccessControl,
    config::FeeConfig,
    fee::{BasisPoints, FeeQuote},
    payout::Payout,
    Address, Amount, LedgerError,
};

/// Parameters the ledger is provisioned with, exactly once.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerGenesis {
    pub operator: Address,
    pub fee_recipient: Address,
    pub fee_basis_points: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposited {
        account: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Withdrawn {
        account: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    /// `amount` is what the recipient received, after the fee.
    Sent {
        from: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    FeeUpdated {
        fee_basis_points: BasisPoints,
    },
}

/// The custodial balance table together with its fee configuration.
///
/// Every mutating call takes the caller explicitly and either commits fully,
/// recording one [`LedgerEvent`], or returns an error with nothing changed.
#[derive(Clone, Debug)]
pub struct Ledger {
    pub(crate) access: AccessControl,
    pub(crate) config: FeeConfig,
    pub(crate) balances: BTreeMap<Address, Amount>,
    pub(crate) total_custody: Amount,
    pub(crate) events: Vec<LedgerEvent>,
    /// Set while a withdrawal payout runs; mutations are refused meanwhile.
    pub(crate) payout_in_flight: bool,
}

impl Ledger {
    pub fn initialize(genesis: LedgerGenesis) -> Result<Self, LedgerError> {
        let rate = BasisPoints::new(genesis.fee_basis_points)?;
        info!(
            operator = %genesis.operator,
            fee_recipient = %genesis.fee_recipient,
            fee_basis_points = rate.get(),
            "ledger initialized"
        );
        Ok(Self {
            access: AccessControl::new(genesis.operator),
            config: FeeConfig::new(genesis.fee_recipient, rate),
            balances: BTreeMap::new(),
            total_custody: 0,
            events: Vec::new(),
            payout_in_flight: false,
        })
    }

    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn fee_basis_points(&self) -> BasisPoints {
        self.config.fee_basis_points()
    }

    pub fn fee_recipient(&self) -> &Address {
        self.config.fee_recipient()
    }

    pub fn operator(&self) -> &Address {
        self.access.operator()
    }

    /// Deposited minus withdrawn value; always equals the sum of balances.
    pub fn total_custody(&self) -> Amount {
        self.total_custody
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, Amount)> + '_ {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }

    pub fn is_consistent(&self) -> bool {
        self.balances
            .values()
            .try_fold(0 as Amount, |acc, balance| acc.checked_add(*balance))
            == Some(self.total_custody)
    }

    pub fn deposit(&mut self, caller: &str, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_not_reentered(caller)?;
        let Some(custody) = self.total_custody.checked_add(amount) else {
            warn!(account = %caller, amount = %amount, "deposit rejected: custody overflow");
            return Err(LedgerError::CustodyOverflow { requested: amount });
        };
        self.total_custody = custody;
        self.credit(caller, amount);
        self.events.push(LedgerEvent::Deposited {
            account: caller.to_string(),
            amount,
        });
        info!(account = %caller, amount = %amount, "deposited");
        Ok(())
    }

    /// Debits `caller` and then hands `amount` to `payout`.
    ///
    /// The debit is committed before the payout runs, so a payout reading the
    /// ledger sees the reduced balance. While the payout runs every mutating
    /// call is refused with [`LedgerError::ReentrantCall`]; nothing else can
    /// change, so a failed payout is undone by restoring exactly this debit.
    pub fn withdraw<P>(
        &mut self,
        caller: &str,
        amount: Amount,
        payout: &mut P,
    ) -> Result<(), LedgerError>
    where
        P: Payout + ?Sized,
    {
        self.ensure_not_reentered(caller)?;
        self.ensure_funds(caller, amount)?;

        self.debit(caller, amount);
        self.total_custody -= amount;
        self.events.push(LedgerEvent::Withdrawn {
            account: caller.to_string(),
            amount,
        });

        let account = caller.to_string();
        self.payout_in_flight = true;
        let paid = payout.pay_out(self, &account, amount);
        self.payout_in_flight = false;

        if let Err(err) = paid {
            self.events.pop();
            self.total_custody += amount;
            // the key exists unless the debit was a zero-amount no-op
            if let Some(balance) = self.balances.get_mut(caller) {
                *balance += amount;
            }
            warn!(account = %caller, amount = %amount, reason = %err, "withdraw rolled back");
            return Err(LedgerError::PayoutFailed {
                account,
                amount,
                reason: err.reason,
            });
        }
        info!(account = %caller, amount = %amount, "withdrawn");
        Ok(())
    }

    /// Moves `amount` out of `caller`, crediting `recipient` with the net and
    /// the fee recipient with the fee, in that order.
    pub fn send_to(
        &mut self,
        caller: &str,
        recipient: &str,
        amount: Amount,
    ) -> Result<FeeQuote, LedgerError> {
        self.ensure_not_reentered(caller)?;
        self.ensure_funds(caller, amount)?;
        let quote = self.config.quote(amount);
        debug!(amount = %amount, fee = %quote.fee, net = %quote.net, "fee quoted");

        let fee_recipient = self.config.fee_recipient().clone();
        self.debit(caller, amount);
        self.credit(recipient, quote.net);
        self.credit(&fee_recipient, quote.fee);
        self.events.push(LedgerEvent::Sent {
            from: caller.to_string(),
            to: recipient.to_string(),
            amount: quote.net,
        });
        info!(
            from = %caller,
            to = %recipient,
            net = %quote.net,
            fee = %quote.fee,
            fee_recipient = %fee_recipient,
            "sent"
        );
        Ok(quote)
    }

    pub fn set_basis_point(
        &mut self,
        caller: &str,
        new_rate: u32,
    ) -> Result<BasisPoints, LedgerError> {
        self.ensure_not_reentered(caller)?;
        let rate = self
            .config
            .set_basis_point(&self.access, caller, new_rate)
            .inspect_err(|err| warn!(caller = %caller, new_rate, %err, "fee update rejected"))?;
        self.events.push(LedgerEvent::FeeUpdated {
            fee_basis_points: rate,
        });
        info!(fee_basis_points = rate.get(), "fee updated");
        Ok(rate)
    }

    fn ensure_not_reentered(&self, caller: &str) -> Result<(), LedgerError> {
        if self.payout_in_flight {
            warn!(caller = %caller, "call rejected: withdrawal payout in flight");
            return Err(LedgerError::ReentrantCall {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_funds(&self, caller: &str, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(caller);
        if amount > available {
            warn!(account = %caller, requested = %amount, available = %available, "insufficient funds");
            return Err(LedgerError::InsufficientFunds {
                account: caller.to_string(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    // Callers check funds first; a zero debit of an unknown account is a no-op.
    fn debit(&mut self, account: &str, amount: Amount) {
        if let Some(balance) = self.balances.get_mut(account) {
            *balance -= amount;
        }
    }

    // Cannot overflow: every balance is bounded by total_custody, and deposit
    // keeps that representable.
    fn credit(&mut self, account: &str, amount: Amount) {
        *self.balances.entry(account.to_string()).or_insert(0) += amount;
    }
}

/// Amounts travel as decimal strings so that full `u128` values survive JSON.
pub(crate) mod serde_amount {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }

    pub mod map {
        use std::collections::BTreeMap;

        use serde::{de::Error, ser::SerializeMap, Deserialize, Deserializer, Serializer};

        use crate::{Address, Amount};

        pub fn serialize<S>(value: &BTreeMap<Address, Amount>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(value.len()))?;
            for (account, balance) in value {
                map.serialize_entry(account, &balance.to_string())?;
            }
            map.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<Address, Amount>, D::Error>
        where
            D: Deserializer<'de>,
        {
            BTreeMap::<Address, String>::deserialize(deserializer)?
                .into_iter()
                .map(|(account, balance)| {
                    balance
                        .parse()
                        .map(|balance| (account, balance))
                        .map_err(D::Error::custom)
                })
                .collect()
        }
    }
}
