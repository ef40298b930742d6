//! Boundary input validation
//!
//! Each input type has its own validation function. Transports build a
//! [`NewAccountRequest`] from whatever they received and call `validate`
//! before touching the service.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::{AccountId, Currency};
use super::result::{Error, Result};

/// Raw request to open an account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccountRequest {
    pub id: String,
    pub currency: String,
    /// Omitted balance means zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

impl NewAccountRequest {
    pub fn new(id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            currency: currency.into(),
            balance: None,
        }
    }

    pub fn with_balance(mut self, balance: impl Into<String>) -> Self {
        self.balance = Some(balance.into());
        self
    }

    /// Validate every field, reporting the first failure
    pub fn validate(&self) -> Result<(AccountId, Currency, Decimal)> {
        let id = AccountId::parse(&self.id)?;
        let currency = Currency::from_str(&self.currency)?;
        let balance = parse_balance(self.balance.as_deref())?;
        Ok((id, currency, balance))
    }
}

/// Most fractional digits a balance can carry
pub const MAX_BALANCE_SCALE: u32 = 28;

/// Parse an optional balance string
///
/// `None` and blank strings default to zero. Input is accepted only if it
/// is stored exactly as written; anything `Decimal` would round is rejected.
pub fn parse_balance(raw: Option<&str>) -> Result<Decimal> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Decimal::ZERO),
        Some(s) => s,
    };
    if !is_plain_number(raw) {
        return Err(Error::validation(format!("malformed balance {:?}", raw)));
    }

    let fraction_digits = raw.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if fraction_digits > MAX_BALANCE_SCALE as usize {
        return Err(Error::validation(format!(
            "balance {:?} has {} fractional digits, at most {} are supported",
            raw, fraction_digits, MAX_BALANCE_SCALE
        )));
    }

    let inexact = || {
        Error::validation(format!(
            "balance {:?} cannot be stored exactly (max {} fractional digits, magnitude {})",
            raw,
            MAX_BALANCE_SCALE,
            Decimal::MAX
        ))
    };
    let balance = Decimal::from_str(raw).map_err(|_| inexact())?;
    // Too many significant digits overall makes the parser drop scale
    if balance.scale() as usize != fraction_digits {
        return Err(inexact());
    }
    validate_balance(balance)
}

/// Optional sign, digits, optional single decimal point
fn is_plain_number(raw: &str) -> bool {
    let unsigned = raw
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(raw);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(integer.is_empty() && fraction.is_empty())
        && integer.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Opening balances cannot be negative
pub fn validate_balance(balance: Decimal) -> Result<Decimal> {
    if balance < Decimal::ZERO {
        return Err(Error::validation(format!(
            "balance cannot be negative (got {})",
            balance
        )));
    }
    Ok(balance)
}
