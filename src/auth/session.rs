// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and the authenticated session.

use ring::rand::SystemRandom;
use secrecy::{ExposeSecret, SecretString};

use super::credentials::{CredentialRecord, CredentialRepository};
use crate::error::{VaultError, VaultResult};
use crate::storage::RecordStore;

/// The authenticated actor.
///
/// Carries the credential hash because file keys are derived from it. The
/// hash is wiped when the session ends.
pub struct Session {
    actor: String,
    credential_hash: SecretString,
}

impl Session {
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Secret fed to the file key derivation.
    pub(crate) fn key_secret(&self) -> &[u8] {
        self.credential_hash.expose_secret().as_bytes()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

fn validate_username(username: &str) -> VaultResult<()> {
    if username.trim().is_empty() {
        return Err(VaultError::InvalidArgument("username must not be empty".to_string()));
    }
    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(VaultError::InvalidArgument(
            "username must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> VaultResult<()> {
    if password.trim().is_empty() {
        return Err(VaultError::InvalidArgument("password must not be empty".to_string()));
    }
    Ok(())
}

/// Account operations over the credentials table.
pub struct AccountService<'a> {
    credentials: CredentialRepository<'a>,
    rng: SystemRandom,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            credentials: CredentialRepository::new(store),
            rng: SystemRandom::new(),
        }
    }

    /// Create an account.
    ///
    /// # Errors
    /// - `InvalidArgument` for a blank username or password
    /// - `AlreadyExists` if the username is taken
    pub fn register(&self, username: &str, password: &str) -> VaultResult<()> {
        validate_username(username)?;
        validate_password(password)?;

        if self.credentials.get(username)?.is_some() {
            return Err(VaultError::AlreadyExists(format!("user {username}")));
        }
        let record = CredentialRecord::hash_password(&self.rng, username, password)?;
        self.credentials.create(&record)?;

        tracing::info!(actor = %username, "Registered user");
        Ok(())
    }

    /// Verify a username/password pair and open a session.
    ///
    /// # Errors
    /// - `NotFound` for an unknown user
    /// - `PermissionDenied` for a wrong password
    pub fn login(&self, username: &str, password: &str) -> VaultResult<Session> {
        validate_username(username)?;

        let record = self
            .credentials
            .get(username)?
            .ok_or_else(|| VaultError::NotFound(format!("user {username}")))?;

        if !record.verify_password(password)? {
            tracing::warn!(actor = %username, "Rejected login with wrong password");
            return Err(VaultError::permission_denied(username, "account"));
        }

        tracing::info!(actor = %username, "User logged in");
        // the record wipes its own copy on drop
        Ok(Session {
            actor: record.username.clone(),
            credential_hash: SecretString::from(record.credential_hash.clone()),
        })
    }
}
