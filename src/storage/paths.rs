// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the data directory layout.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Directory (under the data dir) that forms the sandbox root boundary.
pub const VAULT_DIR: &str = "vault";

/// Directory (under the data dir) holding one ledger document per tracked path.
/// Lives outside the vault root so sandboxed users can never reach it.
pub const INTEGRITY_DIR: &str = ".integrity";

/// Directory (under the data dir) where atomic writes are staged before the
/// rename. Outside the vault root so no user-chosen name can collide with it.
pub const STAGING_DIR: &str = ".staging";

/// Record store file name.
pub const RECORDS_DB: &str = "records.redb";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom data directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Data directory containing everything below.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root boundary of the sandbox.
    pub fn vault_dir(&self) -> PathBuf {
        self.root.join(VAULT_DIR)
    }

    /// Directory containing all ledger documents.
    pub fn integrity_dir(&self) -> PathBuf {
        self.root.join(INTEGRITY_DIR)
    }

    /// Private staging area for atomic writes.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Ledger document for a root-relative key.
    ///
    /// The key is hashed so that `a/b` and `a_b` never collide; the readable
    /// key is stored inside the document itself.
    pub fn ledger_file(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.integrity_dir().join(format!("{digest}.integrity.json"))
    }

    /// Path to the embedded record store.
    pub fn records_db(&self) -> PathBuf {
        self.root.join(RECORDS_DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_data_dir() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(paths.vault_dir(), PathBuf::from("/tmp/test-data/vault"));
        assert_eq!(
            paths.integrity_dir(),
            PathBuf::from("/tmp/test-data/.integrity")
        );
        assert_eq!(
            paths.records_db(),
            PathBuf::from("/tmp/test-data/records.redb")
        );
    }

    #[test]
    fn ledger_files_do_not_collide_on_separators() {
        let paths = StoragePaths::new("/data");
        assert_ne!(paths.ledger_file("a/b"), paths.ledger_file("a_b"));
        assert_eq!(paths.ledger_file("a/b"), paths.ledger_file("a/b"));
    }

    #[test]
    fn ledger_files_live_in_integrity_dir() {
        let paths = StoragePaths::new("/data");
        let file = paths.ledger_file("notes.txt");
        assert_eq!(file.parent(), Some(paths.integrity_dir().as_path()));
        assert!(file
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".integrity.json")));
    }
}
