// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for every file store operation.
//!
//! Each operation, successful or not, appends one event to the audit journal
//! in the record store. Events are write-once and never updated. Failures of
//! the journal itself are logged through `tracing` and never re-audited.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::records::RecordStore;
use crate::error::{ErrorKind, VaultError, VaultResult};

/// Types of auditable actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Account events
    Register,
    Login,
    Logout,

    // File events
    Create,
    Read,
    Update,
    Delete,
    History,

    // Directory events
    MakeDirectory,
    ChangeDirectory,
    List,

    // Journal access
    AuditTrail,
}

/// An audit journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// Position in the journal, assigned on append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// Actor who triggered the event (if known).
    pub actor: Option<String>,
    /// Root-relative path (or username for account events).
    pub target: Option<String>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure kind if the operation failed.
    pub error_kind: Option<ErrorKind>,
    /// Error message if the operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new (successful) audit event.
    pub fn new(action: AuditAction) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence: None,
            timestamp: Utc::now(),
            action,
            actor: None,
            target: None,
            success: true,
            error_kind: None,
            error: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Mark as failed with the error's kind and message.
    pub fn failed(mut self, error: &VaultError) -> Self {
        self.success = false;
        self.error_kind = Some(error.kind());
        self.error = Some(error.to_string());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> AuditRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Append an event and return its sequence number.
    pub fn log(&self, event: &AuditEvent) -> VaultResult<u64> {
        let json = serde_json::to_vec(event)?;
        Ok(self.store.append_audit(&json)?)
    }

    /// All events in journal order.
    pub fn read_events(&self) -> VaultResult<Vec<AuditEvent>> {
        let mut events = Vec::new();
        for (seq, bytes) in self.store.audit_entries()? {
            let mut event: AuditEvent = serde_json::from_slice(&bytes)?;
            event.sequence = Some(seq);
            events.push(event);
        }
        Ok(events)
    }

    /// Events recorded on a given (UTC) date.
    pub fn read_events_on(&self, date: NaiveDate) -> VaultResult<Vec<AuditEvent>> {
        Ok(self
            .read_events()?
            .into_iter()
            .filter(|e| e.timestamp.date_naive() == date)
            .collect())
    }

    /// Events triggered by an actor.
    pub fn search_by_actor(&self, actor: &str) -> VaultResult<Vec<AuditEvent>> {
        Ok(self
            .read_events()?
            .into_iter()
            .filter(|e| e.actor.as_deref() == Some(actor))
            .collect())
    }

    /// Events concerning a target path.
    pub fn search_by_target(&self, target: &str) -> VaultResult<Vec<AuditEvent>> {
        Ok(self
            .read_events()?
            .into_iter()
            .filter(|e| e.target.as_deref() == Some(target))
            .collect())
    }
}
