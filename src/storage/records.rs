// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `ownership`: root-relative path → serialized OwnershipRecord
//! - `credentials`: username → serialized CredentialRecord
//! - `audit`: monotonically increasing sequence number → serialized AuditEvent
//!
//! Values are opaque JSON bytes at this layer; the typed repositories
//! ([`super::OwnershipRepository`], [`super::AuditRepository`],
//! [`crate::auth::CredentialRepository`]) own the schemas. Every call runs
//! inside [`with_retries`] with the configured attempt ceiling.

use std::io;
use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::retry::{with_retries, Transient};
use crate::error::VaultError;

// =============================================================================
// Table Definitions
// =============================================================================

/// String-keyed table holding serialized records.
pub(crate) type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

pub(crate) const OWNERSHIP: RecordTable = TableDefinition::new("ownership");

pub(crate) const CREDENTIALS: RecordTable = TableDefinition::new("credentials");

/// Append-only: keys are never reused or overwritten.
const AUDIT: TableDefinition<u64, &[u8]> = TableDefinition::new("audit");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("record store I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

fn is_transient_io(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

fn is_transient_storage(e: &redb::StorageError) -> bool {
    match e {
        redb::StorageError::Io(io) => is_transient_io(io),
        _ => false,
    }
}

impl Transient for RecordStoreError {
    fn is_transient(&self) -> bool {
        match self {
            RecordStoreError::RedbDatabase(redb::DatabaseError::DatabaseAlreadyOpen) => true,
            RecordStoreError::RedbDatabase(redb::DatabaseError::Storage(e))
            | RecordStoreError::RedbTransaction(redb::TransactionError::Storage(e))
            | RecordStoreError::RedbTable(redb::TableError::Storage(e))
            | RecordStoreError::RedbCommit(redb::CommitError::Storage(e))
            | RecordStoreError::RedbStorage(e) => is_transient_storage(e),
            RecordStoreError::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

impl From<RecordStoreError> for VaultError {
    fn from(e: RecordStoreError) -> Self {
        VaultError::Persistence(e.to_string())
    }
}

// =============================================================================
// RecordStore
// =============================================================================

/// Embedded ACID record store.
pub struct RecordStore {
    db: Database,
    max_attempts: u32,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path, max_attempts: u32) -> RecordStoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = with_retries(max_attempts, "open", || -> RecordStoreResult<Database> {
            Ok(Database::create(path)?)
        })?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(OWNERSHIP)?;
            let _ = write_txn.open_table(CREDENTIALS)?;
            let _ = write_txn.open_table(AUDIT)?;
        }
        write_txn.commit()?;

        Ok(Self { db, max_attempts })
    }

    // =========================================================================
    // Keyed records
    // =========================================================================

    /// Fetch the value stored under `key`.
    pub(crate) fn get(
        &self,
        table: RecordTable,
        key: &str,
    ) -> RecordStoreResult<Option<Vec<u8>>> {
        with_retries(self.max_attempts, "get", || -> RecordStoreResult<_> {
            let read_txn = self.db.begin_read()?;
            let t = read_txn.open_table(table)?;
            Ok(t.get(key)?.map(|v| v.value().to_vec()))
        })
    }

    /// Insert or replace the value stored under `key`.
    pub(crate) fn put(
        &self,
        table: RecordTable,
        key: &str,
        value: &[u8],
    ) -> RecordStoreResult<()> {
        with_retries(self.max_attempts, "put", || -> RecordStoreResult<_> {
            let write_txn = self.db.begin_write()?;
            {
                let mut t = write_txn.open_table(table)?;
                t.insert(key, value)?;
            }
            write_txn.commit()?;
            Ok(())
        })
    }

    /// Insert only if `key` is absent. Returns `false` when it already existed.
    pub(crate) fn insert_new(
        &self,
        table: RecordTable,
        key: &str,
        value: &[u8],
    ) -> RecordStoreResult<bool> {
        with_retries(self.max_attempts, "insert_new", || -> RecordStoreResult<_> {
            let write_txn = self.db.begin_write()?;
            let inserted = {
                let mut t = write_txn.open_table(table)?;
                if t.get(key)?.is_some() {
                    false
                } else {
                    t.insert(key, value)?;
                    true
                }
            };
            if inserted {
                write_txn.commit()?;
            } else {
                write_txn.abort()?;
            }
            Ok(inserted)
        })
    }

    // =========================================================================
    // Audit journal
    // =========================================================================

    /// Append a journal entry and return its sequence number.
    pub(crate) fn append_audit(&self, value: &[u8]) -> RecordStoreResult<u64> {
        with_retries(self.max_attempts, "append_audit", || -> RecordStoreResult<_> {
            let write_txn = self.db.begin_write()?;
            let seq = {
                let mut t = write_txn.open_table(AUDIT)?;
                let next = t.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
                t.insert(next, value)?;
                next
            };
            write_txn.commit()?;
            Ok(seq)
        })
    }

    /// All journal entries in append order.
    pub(crate) fn audit_entries(&self) -> RecordStoreResult<Vec<(u64, Vec<u8>)>> {
        with_retries(self.max_attempts, "audit_entries", || -> RecordStoreResult<_> {
            let read_txn = self.db.begin_read()?;
            let t = read_txn.open_table(AUDIT)?;
            let mut entries = Vec::new();
            for item in t.iter()? {
                let (k, v) = item?;
                entries.push((k.value(), v.value().to_vec()));
            }
            Ok(entries)
        })
    }
}
