//! Integration tests for payments-core
//!
//! These tests drive the account service end to end against both storage
//! backends, using real DuckDB files in temporary directories.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

use rust_decimal::Decimal;

use payments_core::adapters::duckdb::DuckDbRepository;
use payments_core::adapters::memory::InMemoryRepository;
use payments_core::ports::Repository;
use payments_core::services::AccountManager;
use payments_core::{
    compose_account_service, AccountId, AccountService, AccountState, Currency, EntryPoint, Error,
    NewAccountRequest, PaymentsContext,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a DuckDB repository in `temp_dir` with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path, false).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

/// Run `check` once per storage backend
fn for_each_backend(check: impl Fn(&str, Arc<dyn Repository>)) {
    let temp_dir = TempDir::new().unwrap();
    check("duckdb", create_test_repo(&temp_dir));
    check("memory", Arc::new(InMemoryRepository::new()));
}

fn id(raw: &str) -> AccountId {
    AccountId::parse(raw).unwrap()
}

fn usd(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

// ============================================================================
// Account lifecycle
// ============================================================================

#[test]
fn test_create_then_load_returns_exact_record() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(repo);
        service.create(id("A1"), Currency::Usd, Decimal::ZERO).unwrap();

        let account = service.load(&id("A1")).unwrap();
        assert_eq!(account.id, id("A1"), "{}", backend);
        assert_eq!(account.currency, Currency::Usd, "{}", backend);
        assert_eq!(account.balance, Decimal::ZERO, "{}", backend);
        assert!(!account.deleted, "{}", backend);
    });
}

#[test]
fn test_duplicate_create_leaves_first_account_untouched() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(repo);
        service.create(id("A1"), Currency::Usd, usd("10.50")).unwrap();

        let err = service.create(id("A1"), Currency::Usd, usd("99")).unwrap_err();
        assert!(matches!(err, Error::AccountAlreadyExists(_)), "{}", backend);
        assert_eq!(service.load(&id("A1")).unwrap().balance, usd("10.50"), "{}", backend);
    });
}

#[test]
fn test_delete_hides_account_from_reads() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(Arc::clone(&repo));
        service.create(id("A1"), Currency::Usd, Decimal::ONE).unwrap();
        service.create(id("A2"), Currency::Usd, Decimal::TWO).unwrap();
        service.delete(&id("A2")).unwrap();

        let hidden = service.load(&id("A2"));
        assert!(matches!(hidden, Err(Error::UnknownAccount(_))), "{}", backend);
        let ids: Vec<_> = service
            .load_all()
            .unwrap()
            .into_iter()
            .map(|a| a.id.to_string())
            .collect();
        assert_eq!(ids, vec!["A1"], "{}", backend);

        // Still on record
        let state = repo.find(&id("A2")).unwrap();
        assert!(matches!(state, AccountState::Deleted(_)), "{}", backend);
    });
}

#[test]
fn test_delete_unknown_and_twice() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(repo);
        let ghost = service.delete(&id("ghost"));
        assert!(matches!(ghost, Err(Error::UnknownAccount(_))), "{}", backend);

        service.create(id("A1"), Currency::Usd, Decimal::ZERO).unwrap();
        service.delete(&id("A1")).unwrap();
        let twice = service.delete(&id("A1"));
        assert!(matches!(twice, Err(Error::UnknownAccount(_))), "{}", backend);
    });
}

#[test]
fn test_recreate_after_delete() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(repo);
        service.create(id("A1"), Currency::Usd, usd("1")).unwrap();
        service.delete(&id("A1")).unwrap();
        service.create(id("A1"), Currency::Usd, usd("2")).unwrap();

        assert_eq!(service.load(&id("A1")).unwrap().balance, usd("2"), "{}", backend);
        assert_eq!(service.load_all().unwrap().len(), 1, "{}", backend);
    });
}

#[test]
fn test_boundary_validation_rejects_bad_input() {
    for_each_backend(|backend, repo| {
        let service = AccountManager::new(Arc::clone(&repo));

        let eur = NewAccountRequest::new("A1", "EUR").validate();
        assert!(matches!(eur, Err(Error::Validation(_))), "{}", backend);

        let bad_id = NewAccountRequest::new("bad id!", "USD").validate();
        assert!(matches!(bad_id, Err(Error::Validation(_))), "{}", backend);

        let negative = service.create(id("A1"), Currency::Usd, usd("-1"));
        assert!(matches!(negative, Err(Error::Validation(_))), "{}", backend);

        assert!(repo.find_all().unwrap().is_empty(), "{}", backend);
        assert_eq!(repo.find(&id("A1")).unwrap(), AccountState::Absent, "{}", backend);
    });
}

#[test]
fn test_balance_precision_survives_storage() {
    let temp_dir = TempDir::new().unwrap();
    let service = AccountManager::new(create_test_repo(&temp_dir));

    let precise = usd("1234567890.123456789");
    service.create(id("big"), Currency::Usd, precise).unwrap();
    assert_eq!(service.load(&id("big")).unwrap().balance, precise);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_accounts_persist_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let service = AccountManager::new(create_test_repo(&temp_dir));
        service.create(id("A1"), Currency::Usd, usd("5")).unwrap();
        service.create(id("A2"), Currency::Usd, usd("6")).unwrap();
        service.delete(&id("A2")).unwrap();
    }

    let service = AccountManager::new(create_test_repo(&temp_dir));
    assert_eq!(service.load(&id("A1")).unwrap().balance, usd("5"));
    assert!(matches!(service.load(&id("A2")), Err(Error::UnknownAccount(_))));
    assert_eq!(service.load_all().unwrap().len(), 1);
}

#[test]
fn test_migrations_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);

    let second = repo.run_migrations().unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.already_applied, 2);
}

// ============================================================================
// Context and event log
// ============================================================================

#[test]
fn test_context_records_every_call() {
    let temp_dir = TempDir::new().unwrap();

    {
        let ctx = PaymentsContext::new(temp_dir.path(), EntryPoint::Library).unwrap();
        ctx.accounts.create(id("A1"), Currency::Usd, usd("3")).unwrap();
        ctx.accounts.load(&id("A1")).unwrap();
        ctx.accounts.load_all().unwrap();
        ctx.accounts.delete(&id("A1")).unwrap();
        assert!(ctx.accounts.delete(&id("A1")).is_err());

        let log = ctx.event_log.as_ref().unwrap();
        assert_eq!(log.count().unwrap(), 5);
        assert_eq!(log.error_count().unwrap(), 1);

        let methods: Vec<_> = log
            .get_recent(10)
            .unwrap()
            .into_iter()
            .map(|e| e.method)
            .collect();
        assert_eq!(methods, vec!["delete", "delete", "load_all", "load", "create"]);
    }

    assert!(temp_dir.path().join("payments.duckdb").exists());
    assert!(temp_dir.path().join("logs.duckdb").exists());

    // Reopen: the deleted account stays deleted, the log keeps its entries
    let ctx = PaymentsContext::new(temp_dir.path(), EntryPoint::Library).unwrap();
    assert!(ctx.accounts.load_all().unwrap().is_empty());
    assert_eq!(ctx.event_log.as_ref().unwrap().count().unwrap(), 6);
}

#[test]
fn test_unreadable_event_log_does_not_block_accounts() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("logs.duckdb"),
        b"this is not a duckdb database file, just garbage bytes".repeat(64),
    )
    .unwrap();

    let ctx = PaymentsContext::new(temp_dir.path(), EntryPoint::Cli).unwrap();
    assert!(ctx.event_log.is_none());

    ctx.accounts.create(id("A1"), Currency::Usd, usd("4.20")).unwrap();
    assert_eq!(ctx.accounts.load(&id("A1")).unwrap().balance, usd("4.20"));
    assert_eq!(ctx.accounts.load_all().unwrap().len(), 1);
    ctx.accounts.delete(&id("A1")).unwrap();
    assert!(ctx.accounts.load_all().unwrap().is_empty());
}

#[test]
fn test_event_log_can_be_disabled() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{"database": {"file": "ledger.duckdb"}, "eventLog": {"enabled": false}}"#,
    )
    .unwrap();

    let ctx = PaymentsContext::new(temp_dir.path(), EntryPoint::Cli).unwrap();
    assert!(ctx.event_log.is_none());
    assert_eq!(
        ctx.database_path.as_deref(),
        Some(temp_dir.path().join("ledger.duckdb").as_path())
    );

    ctx.accounts.create(id("A1"), Currency::Usd, Decimal::ZERO).unwrap();
    assert!(!temp_dir.path().join("logs.duckdb").exists());
}

#[test]
fn test_in_memory_context() {
    let ctx = PaymentsContext::in_memory(EntryPoint::Cli).unwrap();
    assert!(ctx.database_path.is_none());

    ctx.accounts.create(id("A1"), Currency::Usd, Decimal::ZERO).unwrap();
    assert_eq!(ctx.accounts.load_all().unwrap().len(), 1);
    assert_eq!(ctx.event_log.as_ref().unwrap().count().unwrap(), 2);
}

#[test]
fn test_decorated_service_matches_plain_service() {
    let ctx = PaymentsContext::in_memory(EntryPoint::Library).unwrap();
    let plain = compose_account_service(Arc::new(InMemoryRepository::new()), None);

    for service in [&ctx.accounts, &plain] {
        service.create(id("A1"), Currency::Usd, usd("7")).unwrap();
    }

    assert_eq!(ctx.accounts.load(&id("A1")).unwrap(), plain.load(&id("A1")).unwrap());
    assert_eq!(
        ctx.accounts.load(&id("nope")).unwrap_err().to_string(),
        plain.load(&id("nope")).unwrap_err().to_string()
    );
}
