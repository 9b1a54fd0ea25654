// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Secure File Store
//!
//! Composes the sandbox, key derivation, cipher, integrity ledger, ownership
//! records and audit journal into the user-facing file operations.
//!
//! ## Ordering
//!
//! - The ledger is checked before any on-disk state is trusted.
//! - Ownership is checked before plaintext leaves the store and before any
//!   mutation, including the deletion tombstone.
//! - The first failing step aborts the operation.
//!
//! Every operation appends one audit event with its outcome. Failures of the
//! record store itself are only logged, since the journal lives there too.

use std::path::{Path, PathBuf};

use crate::auth::{AccountService, Session};
use crate::config::VaultConfig;
use crate::crypto::{Cipher, KeyDeriver};
use crate::error::{ErrorKind, VaultError, VaultResult};
use crate::sandbox::{validate_file_name, DirectoryChange, Sandbox};
use crate::storage::{
    fingerprint, AuditAction, AuditEvent, AuditRepository, IntegrityLedger, LedgerEntry,
    LocalFs, OwnershipCheck, OwnershipRecord, OwnershipRepository, RecordStore,
};

/// A validated, sandbox-resolved file target.
struct Target {
    path: PathBuf,
    key: String,
}

/// The access-controlled file store.
#[derive(Debug)]
pub struct SecureFileStore {
    fs: LocalFs,
    sandbox: Sandbox,
    keys: KeyDeriver,
    cipher: Cipher,
    ledger: IntegrityLedger,
    records: RecordStore,
    session: Option<Session>,
}

impl SecureFileStore {
    /// Open the store under `config.data_dir`, creating its layout if needed.
    pub fn new(config: &VaultConfig) -> VaultResult<Self> {
        let mut fs = LocalFs::new(config.paths());
        fs.initialize()?;
        fs.health_check()?;

        let sandbox = Sandbox::new(fs.paths().vault_dir())?;
        let records = RecordStore::open(&fs.paths().records_db(), config.store_retries)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            root = %sandbox.root().display(),
            "File store opened"
        );

        Ok(Self {
            ledger: IntegrityLedger::new(fs.clone()),
            fs,
            sandbox,
            keys: KeyDeriver::new(),
            cipher: Cipher::new(),
            records,
            session: None,
        })
    }

    /// The canonical root boundary.
    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    /// Current actor, if logged in.
    pub fn whoami(&self) -> Option<&str> {
        self.session.as_ref().map(Session::actor)
    }

    pub fn pwd(&self) -> String {
        self.sandbox.pwd()
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub fn register(&self, username: &str, password: &str) -> VaultResult<()> {
        let result = AccountService::new(&self.records).register(username, password);
        self.record(AuditAction::Register, None, Some(username), result)
    }

    /// Open a session. Only one session may be active at a time.
    pub fn login(&mut self, username: &str, password: &str) -> VaultResult<()> {
        let result = self.login_inner(username, password);
        let actor = result.is_ok().then_some(username);
        self.record(AuditAction::Login, actor, Some(username), result)
    }

    fn login_inner(&mut self, username: &str, password: &str) -> VaultResult<()> {
        if let Some(current) = &self.session {
            return Err(VaultError::InvalidArgument(format!(
                "already logged in as {}; log out first",
                current.actor()
            )));
        }
        let session = AccountService::new(&self.records).login(username, password)?;
        self.session = Some(session);
        self.sandbox.reset();
        Ok(())
    }

    pub fn logout(&mut self) -> VaultResult<()> {
        let Some(session) = self.session.take() else {
            let err = VaultError::InvalidArgument("not logged in".to_string());
            return self.record(AuditAction::Logout, None, None, Err(err));
        };
        self.sandbox.reset();
        tracing::info!(actor = %session.actor(), "User logged out");
        self.record(AuditAction::Logout, Some(session.actor()), None, Ok(()))
    }

    // =========================================================================
    // File operations
    // =========================================================================

    /// Create an empty encrypted file owned by the current actor.
    ///
    /// # Errors
    /// - `InvalidArgument` for a name that is not a single path component
    /// - `AlreadyExists` if anything exists at the path
    /// - `IntegrityViolation` if the path is tracked but its file vanished
    pub fn create(&self, name: &str) -> VaultResult<()> {
        let result = self.create_inner(name);
        self.record_file_op(AuditAction::Create, name, result)
    }

    fn create_inner(&self, name: &str) -> VaultResult<()> {
        let session = self.require_session(name)?;
        let target = self.target(name)?;

        if self.fs.exists(&target.path) {
            return Err(VaultError::AlreadyExists(target.key));
        }
        self.ledger.check_integrity(&target.key, &target.path)?;

        let (file_key, salt) = self.keys.derive_key(session.key_secret())?;
        OwnershipRepository::new(&self.records).put(&OwnershipRecord::new(
            &target.key,
            session.actor(),
            &salt,
        ))?;

        let blob = self.cipher.encrypt(b"", &file_key)?;
        self.fs.create_empty_file(&target.path)?;
        self.fs.write_bytes(&target.path, blob.as_bytes())?;
        self.ledger.append_entry(
            &target.key,
            &fingerprint(blob.as_bytes()),
            blob.as_bytes().len() as u64,
        )?;

        tracing::info!(actor = %session.actor(), path = %target.key, "Created file");
        Ok(())
    }

    /// Decrypt and return the content of a file owned by the current actor.
    ///
    /// # Errors
    /// - `IntegrityViolation` if the file changed outside the store
    /// - `NotFound` if no file exists at the path
    /// - `PermissionDenied` unless the current actor owns the file
    /// - `Crypto` if the ciphertext fails authentication
    pub fn read(&self, name: &str) -> VaultResult<Vec<u8>> {
        let result = self.read_inner(name);
        self.record_file_op(AuditAction::Read, name, result)
    }

    fn read_inner(&self, name: &str) -> VaultResult<Vec<u8>> {
        let session = self.require_session(name)?;
        let target = self.existing_file(name)?;
        let record = self.owned_record(session, &target)?;

        if !self.fs.is_readable(&target.path) {
            return Err(VaultError::NotReadable(target.key));
        }
        let blob = self.fs.read_bytes(&target.path)?;
        let file_key = self
            .keys
            .derive_key_with_salt(session.key_secret(), &record.salt()?);
        let plaintext = self.cipher.decrypt(&blob, &file_key)?;

        tracing::debug!(actor = %session.actor(), path = %target.key, "Read file");
        Ok(plaintext)
    }

    /// Replace the content of a file owned by the current actor.
    pub fn update(&self, name: &str, content: &[u8]) -> VaultResult<()> {
        let result = self.update_inner(name, content);
        self.record_file_op(AuditAction::Update, name, result)
    }

    fn update_inner(&self, name: &str, content: &[u8]) -> VaultResult<()> {
        let session = self.require_session(name)?;
        let target = self.existing_file(name)?;
        let record = self.owned_record(session, &target)?;

        if !self.fs.is_writable(&target.path) {
            return Err(VaultError::NotWritable(target.key));
        }
        let file_key = self
            .keys
            .derive_key_with_salt(session.key_secret(), &record.salt()?);
        let blob = self.cipher.encrypt(content, &file_key)?;
        self.fs.write_bytes(&target.path, blob.as_bytes())?;
        self.ledger.append_entry(
            &target.key,
            &fingerprint(blob.as_bytes()),
            blob.as_bytes().len() as u64,
        )?;

        tracing::info!(actor = %session.actor(), path = %target.key, "Updated file");
        Ok(())
    }

    /// Delete a file owned by the current actor, leaving a ledger tombstone.
    pub fn delete(&self, name: &str) -> VaultResult<()> {
        let result = self.delete_inner(name);
        self.record_file_op(AuditAction::Delete, name, result)
    }

    fn delete_inner(&self, name: &str) -> VaultResult<()> {
        let session = self.require_session(name)?;
        let target = self.existing_file(name)?;
        // ownership before the tombstone: a refused delete must leave the file live
        self.owned_record(session, &target)?;

        self.ledger.append_delete_event(&target.key)?;
        self.fs.delete_file(&target.path)?;

        tracing::info!(actor = %session.actor(), path = %target.key, "Deleted file");
        Ok(())
    }

    /// Ledger history of a file owned by the current actor, oldest first.
    ///
    /// Still available after the file has been deleted.
    pub fn history(&self, name: &str) -> VaultResult<Vec<LedgerEntry>> {
        let result = self.history_inner(name);
        self.record_file_op(AuditAction::History, name, result)
    }

    fn history_inner(&self, name: &str) -> VaultResult<Vec<LedgerEntry>> {
        let session = self.require_session(name)?;
        let target = self.target(name)?;
        self.owned_record(session, &target)?;
        self.ledger.entries(&target.key)
    }

    // =========================================================================
    // Directory operations
    // =========================================================================

    pub fn mkdir(&self, name: &str) -> VaultResult<()> {
        let result = self.mkdir_inner(name);
        self.record_file_op(AuditAction::MakeDirectory, name, result)
    }

    fn mkdir_inner(&self, name: &str) -> VaultResult<()> {
        let session = self.require_session(name)?;
        let target = self.target(name)?;
        if self.fs.exists(&target.path) {
            return Err(VaultError::AlreadyExists(target.key));
        }
        self.fs.create_dir(&target.path)?;
        tracing::info!(actor = %session.actor(), path = %target.key, "Created directory");
        Ok(())
    }

    /// List a directory. An empty `input` lists the current directory.
    pub fn list(&self, input: &str) -> VaultResult<Vec<String>> {
        let result = self.list_inner(input);
        let target = self.audit_key(input);
        let actor = self.whoami();
        self.record(AuditAction::List, actor, Some(&target), result)
    }

    fn list_inner(&self, input: &str) -> VaultResult<Vec<String>> {
        self.require_session(input)?;
        let dir = if input.trim().is_empty() {
            self.sandbox.current_dir().to_path_buf()
        } else {
            self.sandbox.resolve(input.trim())?
        };
        if !self.fs.exists(&dir) {
            return Err(VaultError::NotFound(input.to_string()));
        }
        self.fs.list_entries(&dir)
    }

    pub fn change_directory(&mut self, input: &str) -> VaultResult<DirectoryChange> {
        let result = match self.require_session(input) {
            Ok(_) => self.sandbox.change_directory(input),
            Err(e) => Err(e),
        };
        let target = self.pwd();
        let actor = self.whoami();
        self.record(AuditAction::ChangeDirectory, actor, Some(&target), result)
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Audit events of the current actor, oldest first.
    ///
    /// The lookup itself is journaled after the search, so it shows up in the
    /// next trail rather than this one.
    pub fn audit_trail(&self) -> VaultResult<Vec<AuditEvent>> {
        let result = self.require_session("audit").and_then(|session| {
            AuditRepository::new(&self.records).search_by_actor(session.actor())
        });
        self.record(AuditAction::AuditTrail, self.whoami(), None, result)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_session(&self, resource: &str) -> VaultResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| VaultError::permission_denied("anonymous", resource))
    }

    fn target(&self, name: &str) -> VaultResult<Target> {
        validate_file_name(name)?;
        let path = self.sandbox.resolve(name)?;
        let key = self.sandbox.relative_key(&path)?;
        Ok(Target { path, key })
    }

    /// Resolve `name`, verify it against the ledger and require a regular file.
    fn existing_file(&self, name: &str) -> VaultResult<Target> {
        let target = self.target(name)?;
        self.ledger.check_integrity(&target.key, &target.path)?;

        if self.fs.is_dir(&target.path) {
            return Err(VaultError::InvalidArgument(format!(
                "{} is a directory",
                target.key
            )));
        }
        if !self.fs.is_file(&target.path) {
            return Err(VaultError::NotFound(target.key));
        }
        Ok(target)
    }

    fn owned_record(&self, session: &Session, target: &Target) -> VaultResult<OwnershipRecord> {
        OwnershipRepository::new(&self.records)
            .get(&target.key)
            .verify_owner(session.actor(), &target.key)
    }

    /// Root-relative key for audit targets, falling back to the raw input.
    fn audit_key(&self, input: &str) -> String {
        self.sandbox
            .resolve(input.trim())
            .and_then(|path| self.sandbox.relative_key(&path))
            .unwrap_or_else(|_| input.to_string())
    }

    fn record_file_op<T>(
        &self,
        action: AuditAction,
        name: &str,
        result: VaultResult<T>,
    ) -> VaultResult<T> {
        let target = self.audit_key(name);
        self.record(action, self.whoami(), Some(&target), result)
    }

    /// Append the audit event for an operation and hand its result back.
    fn record<T>(
        &self,
        action: AuditAction,
        actor: Option<&str>,
        target: Option<&str>,
        result: VaultResult<T>,
    ) -> VaultResult<T> {
        let mut event = AuditEvent::new(action);
        if let Some(actor) = actor {
            event = event.with_actor(actor);
        }
        if let Some(target) = target {
            event = event.with_target(target);
        }

        if let Err(err) = &result {
            if err.kind() == ErrorKind::Persistence {
                tracing::error!(?action, error = %err, "Record store failure; audit skipped");
                return result;
            }
            tracing::debug!(?action, error = %err, "Operation failed");
            event = event.failed(err);
        }

        if let Err(err) = AuditRepository::new(&self.records).log(&event) {
            tracing::warn!(?action, error = %err, "Failed to write audit event");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use super::*;
    use crate::storage::DELETED;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> SecureFileStore {
        SecureFileStore::new(&VaultConfig::new(temp.path())).unwrap()
    }

    fn setup() -> (TempDir, SecureFileStore) {
        let temp = TempDir::new().unwrap();
        let mut store = open(&temp);
        store.register("alice", "alice-pw").unwrap();
        store.register("bob", "bob-pw").unwrap();
        store.login("alice", "alice-pw").unwrap();
        (temp, store)
    }

    fn switch_user(store: &mut SecureFileStore, user: &str, password: &str) {
        store.logout().unwrap();
        store.login(user, password).unwrap();
    }

    #[test]
    fn create_update_read_round_trip() {
        let (_temp, store) = setup();

        store.create("notes.txt").unwrap();
        assert!(store.read("notes.txt").unwrap().is_empty());

        store.update("notes.txt", b"hello").unwrap();
        assert_eq!(store.read("notes.txt").unwrap(), b"hello");
    }

    #[test]
    fn content_is_encrypted_at_rest() {
        let (_temp, store) = setup();
        store.create("secret.txt").unwrap();
        store.update("secret.txt", b"attack at dawn").unwrap();

        let raw = fs::read(store.root().join("secret.txt")).unwrap();
        assert_eq!(raw.len(), 12 + b"attack at dawn".len() + 16);
        assert!(!raw.windows(6).any(|w| w == b"attack"));
    }

    #[test]
    fn alice_and_bob() {
        let (_temp, mut store) = setup();

        store.create("notes.txt").unwrap();
        store.update("notes.txt", b"hello").unwrap();
        assert_eq!(store.read("notes.txt").unwrap(), b"hello");

        switch_user(&mut store, "bob", "bob-pw");
        let err = store.read("notes.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let path = store.root().join("notes.txt");
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"X").unwrap();

        switch_user(&mut store, "alice", "alice-pw");
        let err = store.read("notes.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn non_owner_cannot_mutate() {
        let (_temp, mut store) = setup();
        store.create("mine.txt").unwrap();
        store.update("mine.txt", b"v1").unwrap();

        switch_user(&mut store, "bob", "bob-pw");
        for err in [
            store.update("mine.txt", b"pwned").unwrap_err(),
            store.delete("mine.txt").unwrap_err(),
            store.history("mine.txt").map(|_| ()).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        }

        // the failed delete left no tombstone behind
        switch_user(&mut store, "alice", "alice-pw");
        assert_eq!(store.read("mine.txt").unwrap(), b"v1");
        let history = store.history("mine.txt").unwrap();
        assert!(history.iter().all(|e| !e.is_tombstone()));
    }

    #[test]
    fn create_rejects_existing_paths() {
        let (_temp, store) = setup();
        store.create("a.txt").unwrap();
        store.mkdir("dir").unwrap();

        for name in ["a.txt", "dir"] {
            let err = store.create(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists, "{name}");
        }
    }

    #[test]
    fn invalid_names_are_rejected_before_sandboxing() {
        let (_temp, store) = setup();
        for name in ["", "../escape.txt", "a/b.txt", "..", "a\\b"] {
            let err = store.create(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{name:?}");
        }
    }

    #[test]
    fn missing_files() {
        let (_temp, store) = setup();
        for err in [
            store.read("ghost.txt").map(|_| ()).unwrap_err(),
            store.update("ghost.txt", b"x").unwrap_err(),
            store.delete("ghost.txt").unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn untracked_file_has_no_owner() {
        let (_temp, store) = setup();
        fs::write(store.root().join("planted.txt"), b"hi").unwrap();

        let err = store.read("planted.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn delete_leaves_tombstone_and_detects_recreation() {
        let (_temp, store) = setup();
        store.create("gone.txt").unwrap();
        store.delete("gone.txt").unwrap();

        let path = store.root().join("gone.txt");
        assert!(!path.exists());

        let err = store.read("gone.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let history = store.history("gone.txt").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].fingerprint, DELETED);

        fs::write(&path, b"impostor").unwrap();
        let err = store.read("gone.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn vanished_file_is_an_integrity_violation() {
        let (_temp, store) = setup();
        store.create("v.txt").unwrap();
        fs::remove_file(store.root().join("v.txt")).unwrap();

        for err in [
            store.read("v.txt").map(|_| ()).unwrap_err(),
            store.delete("v.txt").unwrap_err(),
            store.create("v.txt").unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
        }
    }

    #[test]
    fn deleted_path_can_be_recreated_by_another_user() {
        let (_temp, mut store) = setup();
        store.create("shared.txt").unwrap();
        store.update("shared.txt", b"alice's").unwrap();
        store.delete("shared.txt").unwrap();

        switch_user(&mut store, "bob", "bob-pw");
        store.create("shared.txt").unwrap();
        store.update("shared.txt", b"bob's").unwrap();
        assert_eq!(store.read("shared.txt").unwrap(), b"bob's");

        // ledger kept the whole story
        let history = store.history("shared.txt").unwrap();
        assert_eq!(history.len(), 5);
        assert!(history[2].is_tombstone());

        switch_user(&mut store, "alice", "alice-pw");
        let err = store.read("shared.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn updates_never_touch_other_users_files() {
        let (_temp, mut store) = setup();
        store.create("a").unwrap();

        switch_user(&mut store, "bob", "bob-pw");
        store.create(".a.sfs-tmp").unwrap();
        store.update(".a.sfs-tmp", b"bob data").unwrap();

        switch_user(&mut store, "alice", "alice-pw");
        store.update("a", b"alice data").unwrap();

        switch_user(&mut store, "bob", "bob-pw");
        assert_eq!(store.read(".a.sfs-tmp").unwrap(), b"bob data");
        switch_user(&mut store, "alice", "alice-pw");
        assert_eq!(store.read("a").unwrap(), b"alice data");
    }

    #[cfg(unix)]
    #[test]
    fn planted_links_cannot_redirect_writes_outside_the_root() {
        let (temp, store) = setup();
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, b"precious").unwrap();

        store.create("a").unwrap();
        std::os::unix::fs::symlink(&outside, store.root().join(".a.sfs-tmp")).unwrap();
        store.update("a", b"x").unwrap();

        assert_eq!(fs::read(&outside).unwrap(), b"precious");
        assert_eq!(store.read("a").unwrap(), b"x");
    }

    #[test]
    fn ledger_grows_with_every_write() {
        let (_temp, store) = setup();
        store.create("log.txt").unwrap();
        for (i, content) in ["a", "bb", "ccc"].iter().enumerate() {
            store.update("log.txt", content.as_bytes()).unwrap();
            let history = store.history("log.txt").unwrap();
            assert_eq!(history.len(), i + 2);
            assert_eq!(history.last().unwrap().size, (12 + content.len() + 16) as u64);
        }
    }

    #[test]
    fn operations_require_a_session() {
        let (_temp, mut store) = setup();
        store.create("a.txt").unwrap();
        store.logout().unwrap();

        for err in [
            store.create("b.txt").unwrap_err(),
            store.read("a.txt").map(|_| ()).unwrap_err(),
            store.update("a.txt", b"x").unwrap_err(),
            store.delete("a.txt").unwrap_err(),
            store.mkdir("d").unwrap_err(),
            store.list("").map(|_| ()).unwrap_err(),
            store.change_directory("/").map(|_| ()).unwrap_err(),
            store.audit_trail().map(|_| ()).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        }
    }

    #[test]
    fn session_lifecycle() {
        let (_temp, mut store) = setup();
        assert_eq!(store.whoami(), Some("alice"));

        let err = store.login("bob", "bob-pw").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        store.logout().unwrap();
        assert_eq!(store.whoami(), None);
        let err = store.logout().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = store.login("alice", "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(store.whoami(), None);
    }

    #[test]
    fn directories_and_navigation() {
        let (_temp, mut store) = setup();
        store.mkdir("docs").unwrap();
        store.change_directory("docs").unwrap();
        assert_eq!(store.pwd(), "/docs");

        store.create("inner.txt").unwrap();
        store.update("inner.txt", b"nested").unwrap();
        assert_eq!(store.list("").unwrap(), vec!["inner.txt".to_string()]);

        store.change_directory("..").unwrap();
        assert_eq!(store.list("").unwrap(), vec!["docs/".to_string()]);
        assert_eq!(store.list("docs").unwrap(), vec!["inner.txt".to_string()]);

        assert_eq!(
            store.change_directory("..").unwrap(),
            DirectoryChange::AlreadyAtRoot
        );
        let err = store.change_directory("../..").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        let err = store.list("..").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);

        store.change_directory("docs").unwrap();
        assert_eq!(store.read("inner.txt").unwrap(), b"nested");

        // login resets the current directory
        store.logout().unwrap();
        store.login("alice", "alice-pw").unwrap();
        assert_eq!(store.pwd(), "/");
    }

    #[test]
    fn ledger_lives_outside_the_root() {
        let (temp, store) = setup();
        store.create("a.txt").unwrap();

        assert_eq!(store.list("").unwrap(), vec!["a.txt".to_string()]);
        assert!(temp.path().join(".integrity").is_dir());
        assert!(!store.root().join(".integrity").exists());
    }

    #[test]
    fn every_operation_is_audited() {
        let (_temp, mut store) = setup();
        store.create("a.txt").unwrap();
        store.read("a.txt").unwrap();
        let _ = store.read("missing.txt");

        switch_user(&mut store, "bob", "bob-pw");
        let _ = store.read("a.txt");

        let trail = store.audit_trail().unwrap();
        let denied = trail.last().unwrap();
        assert_eq!(denied.action, AuditAction::Read);
        assert!(!denied.success);
        assert_eq!(denied.error_kind, Some(ErrorKind::PermissionDenied));
        assert_eq!(denied.target.as_deref(), Some("a.txt"));

        switch_user(&mut store, "alice", "alice-pw");
        let trail = store.audit_trail().unwrap();
        let actions: Vec<_> = trail.iter().map(|e| (e.action, e.success)).collect();
        assert_eq!(
            actions,
            vec![
                (AuditAction::Login, true),
                (AuditAction::Create, true),
                (AuditAction::Read, true),
                (AuditAction::Read, false),
                (AuditAction::Logout, true),
                (AuditAction::Login, true),
            ]
        );
        assert!(trail.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[test]
    fn reading_the_trail_is_audited() {
        let (_temp, mut store) = setup();
        let first = store.audit_trail().unwrap();
        assert!(first.iter().all(|e| e.action != AuditAction::AuditTrail));

        let second = store.audit_trail().unwrap();
        let last = second.last().unwrap();
        assert_eq!(last.action, AuditAction::AuditTrail);
        assert!(last.success);
        assert_eq!(last.actor.as_deref(), Some("alice"));
        assert_eq!(second.len(), first.len() + 1);

        store.logout().unwrap();
        let err = store.audit_trail().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let events = AuditRepository::new(&store.records).read_events().unwrap();
        let anonymous = events.last().unwrap();
        assert_eq!(anonymous.action, AuditAction::AuditTrail);
        assert!(!anonymous.success);
        assert_eq!(anonymous.actor, None);
        assert_eq!(anonymous.error_kind, Some(ErrorKind::PermissionDenied));
    }

    #[test]
    fn state_survives_reopening() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = open(&temp);
            store.register("alice", "pw").unwrap();
            store.login("alice", "pw").unwrap();
            store.create("keep.txt").unwrap();
            store.update("keep.txt", b"persisted").unwrap();
        }

        let mut store = open(&temp);
        assert_eq!(store.whoami(), None);
        store.login("alice", "pw").unwrap();
        assert_eq!(store.read("keep.txt").unwrap(), b"persisted");
    }
}
