//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The account
//! service owns the business rules; the logging decorator and the event log
//! add call recording around it.

mod account;
pub mod event_log;
pub mod logging;
pub mod migration;

pub use account::{AccountManager, AccountService};
pub use event_log::{EntryPoint, EventLog, LogEntry};
pub use logging::LoggingAccountService;
pub use migration::{MigrationResult, MigrationService};
