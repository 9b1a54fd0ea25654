// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure File Store - encrypted, tamper-evident local file vault
//!
//! Files live under a sandboxed root and are encrypted with AES-256-GCM under
//! per-file keys derived from the owner's credential material. Every write is
//! fingerprinted into an append-only integrity ledger, every access is gated
//! on ownership, and every operation lands in an audit journal.
//!
//! ## Modules
//!
//! - `auth` - Local accounts and the active session
//! - `crypto` - PBKDF2 key derivation and AES-256-GCM
//! - `sandbox` - Path resolution confined to the root boundary
//! - `storage` - Filesystem, integrity ledger and record store (redb)
//! - `vault` - The access-controlled file store
//! - `shell` - Interactive command surface

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod sandbox;
pub mod shell;
pub mod storage;
pub mod vault;

pub use config::VaultConfig;
pub use error::{ErrorKind, VaultError, VaultResult};
pub use vault::SecureFileStore;
