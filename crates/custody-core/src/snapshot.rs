//! Serializable image of a [`Ledger`], committed to by a SHA-256 state root.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    access::AccessControl,
    config::FeeConfig,
    fee::BasisPoints,
    ledger::{serde_amount, Ledger, LedgerEvent},
    Address, Amount, LedgerError,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub operator: Address,
    pub fee_recipient: Address,
    pub fee_basis_points: u32,
    #[serde(with = "serde_amount")]
    pub total_custody: Amount,
    #[serde(with = "serde_amount::map")]
    pub balances: BTreeMap<Address, Amount>,
    pub events: Vec<LedgerEvent>,
    /// Hex SHA-256 root over the configuration and every balance.
    pub state_root: String,
}

impl Ledger {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            operator: self.operator().clone(),
            fee_recipient: self.fee_recipient().clone(),
            fee_basis_points: self.fee_basis_points().get(),
            total_custody: self.total_custody,
            balances: self.balances.clone(),
            events: self.events.clone(),
            state_root: hex::encode(self.state_root()),
        }
    }

    pub fn state_root(&self) -> [u8; 32] {
        compute_state_root(
            self.operator(),
            self.fee_recipient(),
            self.fee_basis_points().get(),
            self.total_custody,
            &self.balances,
        )
    }

    /// Rebuilds a ledger, refusing snapshots that break its invariants or
    /// whose recorded root does not match their contents.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let rate = BasisPoints::new(snapshot.fee_basis_points).map_err(|_| {
            LedgerError::InvalidSnapshot(format!(
                "fee basis points {} exceed base",
                snapshot.fee_basis_points
            ))
        })?;
        let ledger = Ledger {
            access: AccessControl::new(snapshot.operator),
            config: FeeConfig::new(snapshot.fee_recipient, rate),
            balances: snapshot.balances,
            total_custody: snapshot.total_custody,
            events: snapshot.events,
            payout_in_flight: false,
        };
        if !ledger.is_consistent() {
            return Err(LedgerError::InvalidSnapshot(
                "balances do not sum to total custody".into(),
            ));
        }
        let root = hex::encode(ledger.state_root());
        if root != snapshot.state_root {
            return Err(LedgerError::InvalidSnapshot(format!(
                "state root mismatch: recorded {}, computed {root}",
                snapshot.state_root
            )));
        }
        Ok(ledger)
    }
}

fn compute_state_root(
    operator: &str,
    fee_recipient: &str,
    fee_basis_points: u32,
    total_custody: Amount,
    balances: &BTreeMap<Address, Amount>,
) -> [u8; 32] {
    let mut leaves = Vec::with_capacity(balances.len() + 1);

    let mut config = Sha256::new();
    config.update(b"custody/config");
    update_str(&mut config, operator);
    update_str(&mut config, fee_recipient);
    config.update(fee_basis_points.to_be_bytes());
    config.update(total_custody.to_be_bytes());
    leaves.push(config.finalize().into());

    for (account, balance) in balances {
        let mut leaf = Sha256::new();
        leaf.update(b"custody/balance");
        update_str(&mut leaf, account);
        leaf.update(balance.to_be_bytes());
        leaves.push(leaf.finalize().into());
    }
    fold_merkle(leaves)
}

// Length-prefixed so adjacent strings cannot collide.
fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

// Pairs are hashed level by level; an odd node moves up unchanged.
fn fold_merkle(mut level: Vec<[u8; 32]>) -> [u8; 32] {
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    let mut node = Sha256::new();
                    node.update(b"custody/node");
                    node.update(left);
                    node.update(right);
                    node.finalize().into()
                }
                _ => pair[0],
            })
            .collect();
    }
    level[0]
}
