//! Proportional transfer fees expressed in basis points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, LedgerError};

/// 100% in basis points; one basis point is 0.01%.
pub const BASE: u32 = 10_000;

/// A fee rate that is known to be at most [`BASE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BasisPoints(u32);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BASE);

    pub fn new(value: u32) -> Result<Self, LedgerError> {
        if value > BASE {
            return Err(LedgerError::FeeBasisPointsExceedBase { requested: value });
        }
        Ok(Self(value))
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for BasisPoints {
    type Error = LedgerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BasisPoints> for u32 {
    fn from(bps: BasisPoints) -> Self {
        bps.0
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// How a gross transfer amount splits between the fee recipient and the payee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: Amount,
    pub net: Amount,
}

/// Splits `amount` into `fee = floor(amount * bps / BASE)` and `net = amount - fee`.
///
/// The product is never formed directly: with `amount = q * BASE + r` the
/// floor equals `q * bps + floor(r * bps / BASE)`, and both terms are bounded
/// by `amount` and `BASE * BASE` respectively, so no `u128` amount overflows.
pub fn compute_fee(amount: Amount, bps: BasisPoints) -> FeeQuote {
    let base = Amount::from(BASE);
    let rate = Amount::from(bps.get());
    let fee = (amount / base) * rate + (amount % base) * rate / base;
    FeeQuote {
        fee,
        net: amount - fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHER: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn ten_bps_on_one_unit() {
        let quote = compute_fee(ETHER, BasisPoints::new(10).unwrap());
        assert_eq!(quote.fee, ETHER * 10 / 10_000);
        assert_eq!(quote.net, ETHER - ETHER / 1_000);
    }

    #[test]
    fn fee_is_floored() {
        let quote = compute_fee(9_999, BasisPoints::new(1).unwrap());
        assert_eq!(quote, FeeQuote { fee: 0, net: 9_999 });
        let quote = compute_fee(10_001, BasisPoints::new(1).unwrap());
        assert_eq!(quote, FeeQuote { fee: 1, net: 10_000 });
    }

    #[test]
    fn full_rate_takes_everything() {
        let quote = compute_fee(12_345, BasisPoints::MAX);
        assert_eq!(quote, FeeQuote { fee: 12_345, net: 0 });
        let quote = compute_fee(12_345, BasisPoints::ZERO);
        assert_eq!(quote, FeeQuote { fee: 0, net: 12_345 });
    }

    #[test]
    fn max_amount_does_not_overflow() {
        let quote = compute_fee(Amount::MAX, BasisPoints::new(9_999).unwrap());
        assert_eq!(quote.fee + quote.net, Amount::MAX);
        assert!(quote.fee < Amount::MAX);
    }

    #[test]
    fn rejects_rate_above_base() {
        assert_eq!(
            BasisPoints::new(100_000),
            Err(LedgerError::FeeBasisPointsExceedBase { requested: 100_000 })
        );
        assert!(BasisPoints::new(BASE).is_ok());
        assert!(serde_json::from_str::<BasisPoints>("10001").is_err());
        assert_eq!(serde_json::from_str::<BasisPoints>("250").unwrap().get(), 250);
    }
}
