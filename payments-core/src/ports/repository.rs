//! Repository port - account storage abstraction

use crate::domain::result::Result;
use crate::domain::{Account, AccountId, AccountState};

/// Account storage
///
/// All calls block until storage answers. Implementations must make `store`
/// reject a second active account for the same id; the service checks too,
/// but only storage can close the race between two concurrent creates.
pub trait Repository: Send + Sync {
    /// Persist a new account
    ///
    /// Fails with `AccountAlreadyExists` if an active account already uses the id.
    fn store(&self, account: &Account) -> Result<()>;

    /// Look up an id regardless of its deleted flag
    ///
    /// Returns the active record if there is one, otherwise the most recent
    /// deleted record, otherwise `Absent`.
    fn find(&self, id: &AccountId) -> Result<AccountState>;

    /// All active accounts, ordered by id
    fn find_all(&self) -> Result<Vec<Account>>;

    /// Flip the active account's deleted flag
    ///
    /// Fails with `UnknownAccount` if there is no active account for the id.
    fn mark_deleted(&self, id: &AccountId) -> Result<()>;
}
