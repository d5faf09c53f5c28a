use serde::{Deserialize, Serialize};

use crate::{
    access::AccessControl,
    fee::{compute_fee, BasisPoints, FeeQuote},
    Address, Amount, LedgerError,
};

/// Where transfer fees go and how large they are.
///
/// The recipient is fixed at construction. The rate only changes through
/// [`FeeConfig::set_basis_point`], which requires the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    fee_recipient: Address,
    fee_basis_points: BasisPoints,
}

impl FeeConfig {
    pub fn new(fee_recipient: impl Into<Address>, fee_basis_points: BasisPoints) -> Self {
        Self {
            fee_recipient: fee_recipient.into(),
            fee_basis_points,
        }
    }

    pub fn fee_recipient(&self) -> &Address {
        &self.fee_recipient
    }

    pub fn fee_basis_points(&self) -> BasisPoints {
        self.fee_basis_points
    }

    pub fn quote(&self, amount: Amount) -> FeeQuote {
        compute_fee(amount, self.fee_basis_points)
    }

    /// Authorization is checked before the rate, so a non-operator is
    /// rejected as `Unauthorized` whatever rate it proposes.
    pub fn set_basis_point(
        &mut self,
        access: &AccessControl,
        caller: &str,
        new_rate: u32,
    ) -> Result<BasisPoints, LedgerError> {
        access.authorize(caller)?;
        let rate = BasisPoints::new(new_rate)?;
        self.fee_basis_points = rate;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (FeeConfig, AccessControl) {
        (
            FeeConfig::new("company", BasisPoints::new(10).unwrap()),
            AccessControl::new("owner"),
        )
    }

    #[test]
    fn operator_updates_rate() {
        let (mut config, access) = setup();
        let rate = config.set_basis_point(&access, "owner", 1_000).unwrap();
        assert_eq!(rate.get(), 1_000);
        assert_eq!(config.fee_basis_points().get(), 1_000);
        assert_eq!(config.fee_recipient(), "company");
    }

    #[test]
    fn unauthorized_wins_over_bad_rate() {
        let (mut config, access) = setup();
        let err = config.set_basis_point(&access, "bob", 100_000).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert_eq!(config.fee_basis_points().get(), 10);
    }

    #[test]
    fn operator_cannot_exceed_base() {
        let (mut config, access) = setup();
        let err = config.set_basis_point(&access, "owner", 100_000).unwrap_err();
        assert_eq!(
            err,
            LedgerError::FeeBasisPointsExceedBase { requested: 100_000 }
        );
        assert_eq!(config.fee_basis_points().get(), 10);
    }
}
