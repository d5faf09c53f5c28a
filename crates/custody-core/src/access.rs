use serde::{Deserialize, Serialize};

use crate::{Address, LedgerError};

/// The single privileged identity allowed to retune the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    operator: Address,
}

impl AccessControl {
    pub fn new(operator: impl Into<Address>) -> Self {
        Self {
            operator: operator.into(),
        }
    }

    pub fn operator(&self) -> &Address {
        &self.operator
    }

    pub fn is_operator(&self, caller: &str) -> bool {
        self.operator == caller
    }

    pub fn authorize(&self, caller: &str) -> Result<(), LedgerError> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            })
        }
    }
}
