//! Decimal <-> scaled-integer conversion.
//!
//! Amounts cross the wire as integers scaled by `10^decimals` (18 for ETH).
//! User input is a decimal string; display values are rounded to hundredths.

use alloy_primitives::utils::{self, Unit};
use alloy_primitives::U256;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Decimal places used by the ATM contract.
pub const ETH_DECIMALS: u8 = 18;

/// Largest scale accepted from configuration.
pub const MAX_DECIMALS: u8 = 64;

/// Decimal digits of `U256::MAX` minus one; longer scaled values may not fit.
const MAX_DIGITS: usize = 77;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("invalid decimal value: {0:?}")]
    InvalidDecimal(String),
    #[error("fractional component exceeds {0} decimals")]
    TooManyDecimals(u8),
    #[error("value out of range")]
    Overflow,
    #[error("unsupported unit scale: {0}")]
    UnsupportedScale(u8),
}

fn unit(decimals: u8) -> Result<Unit, UnitsError> {
    Unit::new(decimals).ok_or(UnitsError::UnsupportedScale(decimals))
}

fn scale(decimals: u8) -> Result<U256, UnitsError> {
    unit(decimals)?;
    Ok(U256::from(10u64).pow(U256::from(decimals)))
}

/// Parse a non-negative decimal string into a scaled integer.
///
/// Stricter than `alloy_primitives::utils::parse_units`: signs, exponents and
/// excess fractional digits are rejected instead of accepted or truncated.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, UnitsError> {
    unit(decimals)?;
    let trimmed = value.trim();
    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(UnitsError::InvalidDecimal(value.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals(decimals));
    }
    if whole.trim_start_matches('0').len() + decimals as usize > MAX_DIGITS {
        return Err(UnitsError::Overflow);
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let canonical = if frac.is_empty() { whole.to_string() } else { format!("{whole}.{frac}") };
    utils::parse_units(&canonical, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|_| UnitsError::Overflow)
}

/// Full-precision decimal rendering, trailing fractional zeros trimmed.
pub fn format_units(raw: U256, decimals: u8) -> Result<String, UnitsError> {
    unit(decimals)?;
    if decimals == 0 {
        return Ok(raw.to_string());
    }
    let full = utils::format_units(raw, decimals).map_err(|_| UnitsError::Overflow)?;
    let trimmed = full.trim_end_matches('0');
    Ok(if trimmed.ends_with('.') { format!("{trimmed}0") } else { trimmed.to_string() })
}

/// An amount rounded to hundredths, the session's display precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EthAmount {
    hundredths: U256,
}

impl EthAmount {
    /// Round a scaled integer half-up to two fractional digits.
    pub fn from_raw(raw: U256, decimals: u8) -> Result<Self, UnitsError> {
        let hundredths = if decimals <= 2 {
            let up = scale(2 - decimals)?;
            raw.checked_mul(up).ok_or(UnitsError::Overflow)?
        } else {
            let unit = scale(decimals - 2)?;
            let half = unit / U256::from(2u64);
            raw.checked_add(half).ok_or(UnitsError::Overflow)? / unit
        };
        Ok(Self { hundredths })
    }

    /// Parse a decimal string and round it the same way a fetched balance is.
    pub fn parse(value: &str) -> Result<Self, UnitsError> {
        Self::from_raw(parse_units(value, ETH_DECIMALS)?, ETH_DECIMALS)
    }
}

impl fmt::Display for EthAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundred = U256::from(100u64);
        let whole = self.hundredths / hundred;
        let cents = (self.hundredths % hundred).as_limbs()[0];
        write!(f, "{}.{:02}", whole, cents)
    }
}

impl Serialize for EthAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
