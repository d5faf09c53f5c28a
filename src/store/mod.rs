use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use anyhow::{Context, Result};
use custody_core::{Address, Amount, Ledger, LedgerSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One line of the payout log: value that left custody.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutRecord {
    pub to: Address,
    pub amount: String,
    /// Root of the state file that already reflects the debit.
    pub state_root: String,
}

pub fn load(path: &Path) -> Result<Ledger> {
    let bytes = fs::read(path).with_context(|| {
        format!(
            "read state file {} (run `custody init` first)",
            path.display()
        )
    })?;
    let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse state file {}", path.display()))?;
    let ledger = Ledger::restore(snapshot)
        .with_context(|| format!("restore ledger from {}", path.display()))?;
    debug!(path = %path.display(), accounts = ledger.accounts().count(), "state loaded");
    Ok(ledger)
}

/// Writes the snapshot beside `path` and renames it into place.
pub fn save(path: &Path, ledger: &Ledger) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let snapshot = ledger.snapshot();
    let json = serde_json::to_vec_pretty(&snapshot)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    debug!(path = %path.display(), state_root = %snapshot.state_root, "state saved");
    Ok(())
}

pub fn append_payouts(path: &Path, transfers: &[(Address, Amount)], state_root: &str) -> Result<()> {
    if transfers.is_empty() {
        return Ok(());
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open payout log {}", path.display()))?;
    for (to, amount) in transfers {
        let record = PayoutRecord {
            to: to.clone(),
            amount: amount.to_string(),
            state_root: state_root.to_string(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        file.write_all(&line)
            .with_context(|| format!("append to payout log {}", path.display()))?;
    }
    Ok(())
}
