// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership records and enforcement.
//!
//! Every file created through the store gets an [`OwnershipRecord`] fixing
//! its owner and the salt its key is derived with. Any disclosure or
//! mutation of the file must pass [`OwnershipEnforcer::verify_ownership`]
//! first. A missing record denies access rather than granting it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{RecordStore, OWNERSHIP};
use crate::crypto::Salt;
use crate::error::{VaultError, VaultResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// The owning actor.
    fn owner(&self) -> &str;

    /// Human-readable name used in denial messages.
    fn resource_name(&self) -> &str;
}

/// Trait for enforcing ownership before access.
pub trait OwnershipEnforcer {
    /// Verify that `actor` owns this resource.
    ///
    /// # Errors
    /// Returns `VaultError::PermissionDenied` if the actor doesn't own it.
    fn verify_ownership(&self, actor: &str) -> VaultResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, actor: &str) -> VaultResult<()> {
        if self.owner() == actor {
            Ok(())
        } else {
            Err(VaultError::permission_denied(actor, self.resource_name()))
        }
    }
}

/// Ownership verification on lookups that may come back empty.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    ///
    /// `resource` names the target when there is nothing to verify against.
    fn verify_owner(self, actor: &str, resource: &str) -> VaultResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owner(self, actor: &str, resource: &str) -> VaultResult<T> {
        match self {
            Some(record) => {
                record.verify_ownership(actor)?;
                Ok(record)
            }
            None => Err(VaultError::permission_denied(actor, resource)),
        }
    }
}

impl<T: OwnedResource> OwnershipCheck<T> for VaultResult<Option<T>> {
    fn verify_owner(self, actor: &str, resource: &str) -> VaultResult<T> {
        self?.verify_owner(actor, resource)
    }
}

/// Durable (path, owner, salt) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    /// Root-relative path of the file.
    pub path: String,
    /// Actor who created the file.
    pub owner: String,
    /// Base64 per-file KDF salt.
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl OwnershipRecord {
    pub fn new(path: impl Into<String>, owner: impl Into<String>, salt: &Salt) -> Self {
        Self {
            path: path.into(),
            owner: owner.into(),
            salt: salt.to_base64(),
            created_at: Utc::now(),
        }
    }

    /// Decoded KDF salt.
    pub fn salt(&self) -> VaultResult<Salt> {
        Salt::from_base64(&self.salt)
    }
}

impl OwnedResource for OwnershipRecord {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn resource_name(&self) -> &str {
        &self.path
    }
}

/// Repository for ownership records.
pub struct OwnershipRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> OwnershipRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Look up the record for a root-relative path.
    pub fn get(&self, path: &str) -> VaultResult<Option<OwnershipRecord>> {
        match self.store.get(OWNERSHIP, path)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the record for a newly created file.
    ///
    /// A record left behind by a file deleted through the store is replaced;
    /// the caller guarantees no live file exists at the path.
    pub fn put(&self, record: &OwnershipRecord) -> VaultResult<()> {
        let json = serde_json::to_vec(record)?;
        self.store.put(OWNERSHIP, &record.path, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyDeriver;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn record(owner: &str) -> OwnershipRecord {
        let (_, salt) = KeyDeriver::new().derive_key(b"secret").unwrap();
        OwnershipRecord::new("notes.txt", owner, &salt)
    }

    #[test]
    fn ownership_verification_passes_for_owner() {
        assert!(record("alice").verify_ownership("alice").is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        let err = record("alice").verify_ownership("bob").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn missing_record_denies_access() {
        let none: Option<OwnershipRecord> = None;
        let err = none.verify_owner("alice", "ghost.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn ownership_check_on_result() {
        let found: VaultResult<Option<OwnershipRecord>> = Ok(Some(record("alice")));
        assert!(found.verify_owner("alice", "notes.txt").is_ok());

        let failed: VaultResult<Option<OwnershipRecord>> =
            Err(VaultError::Persistence("down".into()));
        let err = failed.verify_owner("alice", "notes.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn repository_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::open(&temp.path().join("records.redb"), 3).unwrap();
        let repo = OwnershipRepository::new(&store);

        assert!(repo.get("notes.txt").unwrap().is_none());

        let rec = record("alice");
        repo.put(&rec).unwrap();
        let loaded = repo.get("notes.txt").unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert_eq!(loaded.salt().unwrap(), rec.salt().unwrap());
    }
}
