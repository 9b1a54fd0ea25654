// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Local accounts for the file store.
//!
//! ## Auth Flow
//!
//! 1. `register` stores a salted PBKDF2 hash of the password
//! 2. `login` verifies the password in constant time and yields a [`Session`]
//! 3. The session's credential hash is the secret per-file keys derive from
//!
//! ## Security
//!
//! - Exactly one session is active per process
//! - Passwords cannot be changed: existing file keys depend on the hash

pub mod credentials;
pub mod session;

pub use credentials::{CredentialRecord, CredentialRepository, CREDENTIAL_ITERATIONS};
pub use session::{AccountService, Session};
