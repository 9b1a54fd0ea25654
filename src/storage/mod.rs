// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for the file store: raw file I/O, the integrity ledger and the
//! embedded record store (ownership, credentials, audit journal).
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   vault/                      # Root boundary: users only ever see this
//!     notes.txt                 # nonce || AES-256-GCM ciphertext || tag
//!     docs/...
//!   .integrity/
//!     {sha256(path)}.integrity.json   # Append-only ledger per tracked path
//!   records.redb                # Ownership, credentials, audit journal
//! ```
//!
//! ## Important Notes
//!
//! - The ledger and record store live outside the vault root, so no sandboxed
//!   path can reach them.
//! - Record store calls are retried up to a fixed ceiling on transient
//!   failure; everything else fails immediately.

pub mod audit;
pub mod ledger;
pub mod local_fs;
pub mod ownership;
pub mod paths;
pub mod records;
pub mod retry;

pub use audit::{AuditAction, AuditEvent, AuditRepository};
pub use ledger::{fingerprint, IntegrityLedger, LedgerEntry, DELETED};
pub use local_fs::LocalFs;
pub use ownership::{
    OwnedResource, OwnershipCheck, OwnershipEnforcer, OwnershipRecord, OwnershipRepository,
};
pub use paths::StoragePaths;
pub use records::{RecordStore, RecordStoreError};
