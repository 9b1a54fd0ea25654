// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only integrity ledger.
//!
//! One JSON document per tracked path lives under the integrity directory:
//!
//! ```text
//! {
//!   "path": "docs/notes.txt",
//!   "entries": [
//!     { "fingerprint": "<sha256 hex>", "timestamp": "...", "size": 28 },
//!     { "fingerprint": "DELETED", "timestamp": "...", "size": 0 }
//!   ]
//! }
//! ```
//!
//! Entries are only ever appended. Verification is lazy: tampering between
//! two accesses is detected at the next operation on the same path.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::LocalFs;
use crate::error::{VaultError, VaultResult};

/// Fingerprint sentinel marking a deletion performed through the store.
pub const DELETED: &str = "DELETED";

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Lowercase hex SHA-256 of the stored bytes, or [`DELETED`].
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

impl LedgerEntry {
    pub fn is_tombstone(&self) -> bool {
        self.fingerprint == DELETED
    }
}

/// On-disk ledger document for one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerDocument {
    path: String,
    entries: Vec<LedgerEntry>,
}

/// Lowercase hex SHA-256 of `data`.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Integrity ledger over the files of the vault.
///
/// Paths are identified by their root-relative key (see
/// [`crate::sandbox::Sandbox::relative_key`]).
#[derive(Debug, Clone)]
pub struct IntegrityLedger {
    fs: LocalFs,
}

impl IntegrityLedger {
    pub fn new(fs: LocalFs) -> Self {
        Self { fs }
    }

    fn load(&self, key: &str) -> VaultResult<Option<LedgerDocument>> {
        let path = self.fs.paths().ledger_file(key);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let doc: LedgerDocument = self.fs.read_json(&path).map_err(|e| {
            VaultError::IntegrityViolation(format!("unreadable ledger for {key}: {e}"))
        })?;
        Ok(Some(doc))
    }

    fn append(&self, key: &str, entry: LedgerEntry) -> VaultResult<()> {
        let mut doc = self.load(key)?.unwrap_or_else(|| LedgerDocument {
            path: key.to_string(),
            entries: Vec::new(),
        });
        doc.entries.push(entry);
        self.fs.write_json(self.fs.paths().ledger_file(key), &doc)
    }

    /// Append a content entry, creating the ledger for `key` if absent.
    pub fn append_entry(&self, key: &str, fingerprint: &str, size: u64) -> VaultResult<()> {
        self.append(
            key,
            LedgerEntry {
                fingerprint: fingerprint.to_string(),
                timestamp: Utc::now(),
                size,
            },
        )
    }

    /// Append a tombstone for `key`.
    pub fn append_delete_event(&self, key: &str) -> VaultResult<()> {
        self.append_entry(key, DELETED, 0)
    }

    /// Most recent entry, or `None` if the path has never been tracked.
    pub fn load_last_entry(&self, key: &str) -> VaultResult<Option<LedgerEntry>> {
        Ok(self.load(key)?.and_then(|doc| doc.entries.last().cloned()))
    }

    /// Full history for `key`, oldest first.
    pub fn entries(&self, key: &str) -> VaultResult<Vec<LedgerEntry>> {
        Ok(self.load(key)?.map(|doc| doc.entries).unwrap_or_default())
    }

    /// Verify the physical file at `path` against the last entry for `key`.
    ///
    /// - untracked: pass
    /// - tombstone: fail if the file exists again
    /// - otherwise: the live fingerprint and size must match
    pub fn check_integrity(&self, key: &str, path: &Path) -> VaultResult<()> {
        let Some(last) = self.load_last_entry(key)? else {
            return Ok(());
        };

        if last.is_tombstone() {
            if self.fs.exists(path) {
                tracing::warn!(path = %key, "Deleted file was recreated outside the store");
                return Err(VaultError::IntegrityViolation(format!(
                    "{key} was deleted but has been recreated"
                )));
            }
            return Ok(());
        }

        if !self.fs.is_file(path) {
            tracing::warn!(path = %key, "Tracked file vanished outside the store");
            return Err(VaultError::IntegrityViolation(format!(
                "{key} is tracked but missing"
            )));
        }

        let data = self.fs.read_bytes(path)?;
        if data.len() as u64 != last.size || fingerprint(&data) != last.fingerprint {
            tracing::warn!(path = %key, "Content does not match the ledger");
            return Err(VaultError::IntegrityViolation(format!(
                "{key} was modified outside the store"
            )));
        }
        Ok(())
    }
}
