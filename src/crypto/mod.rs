// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Derivation & Authenticated Cipher
//!
//! Per-file keys are derived with PBKDF2-HMAC-SHA256 from the current user's
//! stored credential hash and a per-file random salt. File content is sealed
//! with AES-256-GCM under a fresh random nonce on every write.
//!
//! ## Threat Model Note
//!
//! The KDF secret is the credential hash held in the record store, not the
//! raw password. Anyone able to read the record store can therefore derive
//! every user's file keys. Hardening this (e.g. deriving from the password
//! at login and keeping the result only in the session) changes the threat
//! model and must be treated as a deliberate redesign.
//!
//! Keys are never persisted. They live for a single encrypt or decrypt call
//! and are wiped on drop.

pub mod cipher;
pub mod kdf;

pub use cipher::{Cipher, CiphertextBlob, NONCE_LEN, TAG_LEN};
pub use kdf::{Key, KeyDeriver, Salt, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
