// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stored credentials.
//!
//! Passwords are never stored. Each account keeps a random 16-byte salt and
//! `PBKDF2-HMAC-SHA256(password, salt, 100_000)`, both base64-encoded.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::SALT_LEN;
use crate::error::{VaultError, VaultResult};
use crate::storage::records::{RecordStore, CREDENTIALS};

/// PBKDF2 iteration count for password hashing.
pub const CREDENTIAL_ITERATIONS: u32 = 100_000;

/// Length of the stored password hash in bytes.
pub const CREDENTIAL_HASH_LEN: usize = 32;

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(CREDENTIAL_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

/// A registered account. The hash is wiped when the record is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    pub username: String,
    /// Base64 PBKDF2 output. Also the secret file keys are derived from.
    pub credential_hash: String,
    /// Base64 per-user salt.
    pub salt: String,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl CredentialRecord {
    /// Hash `password` under a fresh salt.
    pub fn hash_password(
        rng: &SystemRandom,
        username: &str,
        password: &str,
    ) -> VaultResult<Self> {
        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt)
            .map_err(|_| VaultError::Crypto("system RNG failed to produce a salt".to_string()))?;

        let mut hash = Zeroizing::new([0u8; CREDENTIAL_HASH_LEN]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations(),
            &salt,
            password.as_bytes(),
            &mut hash[..],
        );

        Ok(Self {
            username: username.to_string(),
            credential_hash: Base64::encode_string(&hash[..]),
            salt: Base64::encode_string(&salt),
            created_at: Utc::now(),
        })
    }

    /// Constant-time check of `password` against the stored hash.
    pub fn verify_password(&self, password: &str) -> VaultResult<bool> {
        let salt = Base64::decode_vec(&self.salt)
            .map_err(|e| VaultError::Crypto(format!("invalid credential salt: {e}")))?;
        let expected = Zeroizing::new(
            Base64::decode_vec(&self.credential_hash)
                .map_err(|e| VaultError::Crypto(format!("invalid credential hash: {e}")))?,
        );

        Ok(pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations(),
            &salt,
            password.as_bytes(),
            &expected[..],
        )
        .is_ok())
    }
}

/// Repository for credential records.
pub struct CredentialRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> CredentialRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn get(&self, username: &str) -> VaultResult<Option<CredentialRecord>> {
        match self.store.get(CREDENTIALS, username)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store a new account.
    ///
    /// # Errors
    /// `AlreadyExists` if the username is taken.
    pub fn create(&self, record: &CredentialRecord) -> VaultResult<()> {
        let json = serde_json::to_vec(record)?;
        if self.store.insert_new(CREDENTIALS, &record.username, &json)? {
            Ok(())
        } else {
            Err(VaultError::AlreadyExists(format!("user {}", record.username)))
        }
    }
}
