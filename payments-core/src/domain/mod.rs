//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod request;
pub mod result;

pub use account::{Account, AccountId, AccountState, Currency, MAX_ID_LEN};
pub use request::{parse_balance, validate_balance, NewAccountRequest, MAX_BALANCE_SCALE};
