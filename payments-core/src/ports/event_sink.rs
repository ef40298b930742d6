//! Event sink port - where service call records go

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// One recorded service call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Component that handled the call (e.g. "account")
    pub component: String,
    /// Service method name
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Remaining inputs or a summary of the output, as `key=value` pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub took_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallEvent {
    pub fn new(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
            account_id: None,
            detail: None,
            took_ms: 0,
            error: None,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn took(mut self, elapsed: Duration) -> Self {
        self.took_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Destination for call events
pub trait EventSink: Send + Sync {
    fn record(&self, event: &CallEvent) -> Result<()>;
}
