//! Account domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Maximum length of an account identifier
pub const MAX_ID_LEN: usize = 255;

/// Account identifier
///
/// ASCII alphanumeric, 1 to 255 characters. The only way to obtain one is
/// through [`AccountId::parse`], so every `AccountId` in the system is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate a raw identifier
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::validation("account id cannot be empty"));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(Error::validation(format!(
                "account id must be at most {} characters (got {})",
                MAX_ID_LEN,
                raw.len()
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::validation(format!(
                "account id must be alphanumeric: {:?}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Supported account currencies
///
/// Closed set: anything not listed here is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    /// Every supported currency
    pub const ALL: &'static [Currency] = &[Currency::Usd];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    /// Codes are matched exactly; "usd" is not "USD".
    fn from_str(s: &str) -> Result<Self> {
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == s)
            .ok_or_else(|| {
                let supported: Vec<_> = Currency::ALL.iter().map(|c| c.code()).collect();
                Error::validation(format!(
                    "unsupported currency {:?} (supported: {})",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

/// A financial account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub currency: Currency,
    /// Set once at creation, never mutated afterwards
    pub balance: Decimal,
    /// Soft-delete flag
    pub deleted: bool,
}

impl Account {
    /// Create a new active account
    pub fn new(id: AccountId, currency: Currency, balance: Decimal) -> Self {
        Self {
            id,
            currency,
            balance,
            deleted: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

/// Lifecycle of an account id as seen by storage
///
/// Repositories classify a lookup once, so callers branch on this value
/// instead of re-reading the `deleted` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    Active(Account),
    Deleted(Account),
    Absent,
}

impl AccountState {
    /// Classify a raw storage record
    pub fn classify(record: Option<Account>) -> Self {
        match record {
            Some(account) if account.deleted => AccountState::Deleted(account),
            Some(account) => AccountState::Active(account),
            None => AccountState::Absent,
        }
    }

    /// The account, if it is active
    pub fn into_active(self) -> Option<Account> {
        match self {
            AccountState::Active(account) => Some(account),
            AccountState::Deleted(_) | AccountState::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_accepts_alphanumeric() {
        assert_eq!(AccountId::parse("A1").unwrap().as_str(), "A1");
        assert!(AccountId::parse("abcXYZ0123456789").is_ok());
        assert!(AccountId::parse(&"a".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn test_account_id_rejects_bad_shapes() {
        for raw in ["", "bad id!", "a-b", "a_b", " A1", "ñ1"] {
            let err = AccountId::parse(raw).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?} should be invalid", raw);
        }
        assert!(AccountId::parse(&"a".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_account_id_serde_validates() {
        let id: AccountId = serde_json::from_str("\"A1\"").unwrap();
        assert_eq!(id.to_string(), "A1");
        assert!(serde_json::from_str::<AccountId>("\"bad id\"").is_err());
    }

    #[test]
    fn test_currency_parsing_is_exact() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("EUR".parse::<Currency>().is_err());
        assert!("usd".parse::<Currency>().is_err());
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn test_account_serialization() {
        let account = Account::new(
            AccountId::parse("A1").unwrap(),
            Currency::Usd,
            Decimal::new(1050, 2),
        );
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], "A1");
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["balance"], "10.50");
        assert_eq!(json["deleted"], false);
    }

    #[test]
    fn test_state_classification() {
        let id = AccountId::parse("A1").unwrap();
        let mut account = Account::new(id, Currency::Usd, Decimal::ZERO);
        assert!(matches!(
            AccountState::classify(Some(account.clone())),
            AccountState::Active(_)
        ));

        account.deleted = true;
        let state = AccountState::classify(Some(account));
        assert!(matches!(state, AccountState::Deleted(_)));
        assert!(state.into_active().is_none());

        assert_eq!(AccountState::classify(None), AccountState::Absent);
    }
}
