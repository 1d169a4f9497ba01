//! Audit trail for state-changing operations.
//!
//! Every entry is written as one JSON line on the `labreg::audit` tracing
//! target, so deployments route it with an ordinary `RUST_LOG` directive.

use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::privacy::redact_text;
use crate::session::Session;

/// Tracing target for audit lines.
pub const AUDIT_TARGET: &str = "labreg::audit";

const UNKNOWN: &str = "unknown";

/// One audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Local time the entry was written.
    pub timestamp: NaiveDateTime,
    /// Acting user id, `"unknown"` without a session.
    pub user_id: String,
    /// Acting user's role, `"unknown"` without a session.
    pub user_role: String,
    /// Snake-case action name such as `group_changed`.
    pub action: String,
    /// Client address when known.
    pub ip_address: String,
    /// State before the action.
    pub old_value: Option<String>,
    /// State after the action.
    pub new_value: Option<String>,
    /// Free-text reason.
    pub reason: Option<String>,
}

/// Change details attached to an audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    /// State before the action.
    pub old_value: Option<String>,
    /// State after the action.
    pub new_value: Option<String>,
    /// Free-text reason.
    pub reason: Option<String>,
}

impl Change {
    /// An empty change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the previous state.
    #[must_use]
    pub fn old(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    /// Set the new state.
    #[must_use]
    pub fn new_value(mut self, value: impl Into<String>) -> Self {
        self.new_value = Some(value.into());
        self
    }

    /// Set the reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Writes audit entries.
#[derive(Debug, Default)]
pub struct AuditLog {
    redact: bool,
    retained: Option<Mutex<Vec<AuditEntry>>>,
}

impl AuditLog {
    /// An audit log that only emits tracing events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask personal data in the free-text fields before emitting.
    #[must_use]
    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Also keep a copy of every entry in memory.
    #[must_use]
    pub fn retaining(mut self) -> Self {
        self.retained = Some(Mutex::new(Vec::new()));
        self
    }

    /// Record an action performed by `session` (or an anonymous caller).
    pub fn record(&self, session: Option<&Session>, action: &str, change: Change) -> AuditEntry {
        let clean = |value: Option<String>| {
            if self.redact {
                value.map(|v| redact_text(&v))
            } else {
                value
            }
        };

        let entry = AuditEntry {
            timestamp: Local::now().naive_local(),
            user_id: session.map_or_else(|| UNKNOWN.to_string(), |s| s.user_id.to_string()),
            user_role: session.map_or_else(|| UNKNOWN.to_string(), |s| s.role.to_string()),
            action: action.to_string(),
            ip_address: session
                .and_then(|s| s.remote_addr.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            old_value: clean(change.old_value),
            new_value: clean(change.new_value),
            reason: clean(change.reason),
        };

        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: AUDIT_TARGET, "AUDIT: {}", json),
            Err(e) => warn!(target: AUDIT_TARGET, error = %e, action, "Failed to serialize audit entry"),
        }

        if let Some(retained) = &self.retained {
            retained
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry.clone());
        }
        entry
    }

    /// Entries kept in memory, oldest first. Empty unless [`Self::retaining`] was used.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.retained
            .as_ref()
            .map(|r| r.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }
}
