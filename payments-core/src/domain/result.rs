//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::AccountId;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed a syntactic or domain constraint. Raised before storage is touched.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    /// No active account with this id (it may exist in deleted form)
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Opaque repository failure, passed through untouched
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Classification used by transports to pick a status signal
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::AccountAlreadyExists(_) => ErrorKind::Conflict,
            Error::UnknownAccount(_) => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Coarse error classes, one per transport status family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Client error: bad input
    Validation,
    /// Client error: id already bound to an active account
    Conflict,
    /// Client error: no such active account
    NotFound,
    /// Server error from the repository
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result with context
    pub fn fail_with_context(
        error: impl Into<String>,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }

    /// Failed result describing a core error, with its kind under `context.kind`
    pub fn from_error(error: &Error) -> Self {
        let mut context = HashMap::new();
        context.insert("kind".to_string(), serde_json::json!(error.kind().as_str()));
        Self::fail_with_context(error.to_string(), context)
    }
}
