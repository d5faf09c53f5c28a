//! Decimal rendering of native amounts.
//!
//! Balances are integers of base units; one whole unit is `10^18` of them.

use thiserror::Error;

use crate::Amount;

pub const DECIMALS: usize = 18;
pub const UNIT: Amount = 1_000_000_000_000_000_000; // 1 unit = 1e18 base units

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount {0:?}")]
    Malformed(String),
    #[error("amount {0:?} has more than {} fractional digits", DECIMALS)]
    TooPrecise(String),
    #[error("amount {0:?} is too large")]
    Overflow(String),
}

/// Parses `"1"`, `"0.5"` or `"1.000000000000000001"` into base units.
pub fn parse_units(input: &str) -> Result<Amount, UnitsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (s, ""),
    };
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(UnitsError::Malformed(s.to_string()));
    }
    if frac.len() > DECIMALS {
        return Err(UnitsError::TooPrecise(s.to_string()));
    }

    let overflow = || UnitsError::Overflow(s.to_string());
    let whole_units: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = DECIMALS);
        padded
            .parse()
            .map_err(|_| UnitsError::Malformed(s.to_string()))?
    };
    whole_units
        .checked_mul(UNIT)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Renders base units as a decimal string without trailing zeros.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
