// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw filesystem primitives used by the file store.
//!
//! This module knows nothing about ownership, keys or the sandbox. Callers
//! are expected to hand it paths that have already been resolved by
//! [`crate::sandbox::Sandbox`] (or internal paths derived from
//! [`StoragePaths`]). Every failure is mapped into [`VaultError`].

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use super::StoragePaths;
use crate::error::{VaultError, VaultResult};

/// Filesystem adapter rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    paths: StoragePaths,
    initialized: bool,
}

impl LocalFs {
    /// Create a new LocalFs instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the vault root, the integrity directory and the staging area.
    ///
    /// Safe to call multiple times.
    pub fn initialize(&mut self) -> VaultResult<()> {
        for dir in [
            self.paths.vault_dir(),
            self.paths.integrity_dir(),
            self.paths.staging_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> VaultResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(VaultError::Unknown("storage not initialized".to_string()))
        }
    }

    /// Write-read-delete check of the data directory.
    pub fn health_check(&self) -> VaultResult<()> {
        self.ensure_initialized()?;

        let marker = self.paths.root().join(".health_check");
        let data = b"health_check_data";
        fs::write(&marker, data)?;
        let read_back = fs::read(&marker)?;
        fs::remove_file(&marker)?;

        if read_back != data {
            return Err(VaultError::IntegrityViolation(
                "health check data mismatch".to_string(),
            ));
        }
        Ok(())
    }

    // ========== Queries ==========

    /// Whether anything (file, directory or symlink target) exists at `path`.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_dir()
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Whether the file can be opened for reading.
    pub fn is_readable(&self, path: impl AsRef<Path>) -> bool {
        File::open(path.as_ref()).is_ok()
    }

    /// Whether the file can be opened for writing (without truncating it).
    pub fn is_writable(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(meta) if meta.permissions().readonly() => false,
            Ok(_) => OpenOptions::new().write(true).open(path).is_ok(),
            Err(_) => false,
        }
    }

    /// Names of the entries in `dir`, sorted, directories suffixed with `/`.
    pub fn list_entries(&self, dir: impl AsRef<Path>) -> VaultResult<Vec<String>> {
        self.ensure_initialized()?;

        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(VaultError::NotADirectory(dir.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if entry.path().is_dir() {
                names.push(format!("{name}/"));
            } else {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    // ========== Mutations ==========

    /// Create an empty file; fails if anything already exists at `path`.
    pub fn create_empty_file(&self, path: impl AsRef<Path>) -> VaultResult<()> {
        self.ensure_initialized()?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        Ok(())
    }

    /// Create a single directory; fails if it already exists.
    pub fn create_dir(&self, path: impl AsRef<Path>) -> VaultResult<()> {
        self.ensure_initialized()?;
        fs::create_dir(path.as_ref())?;
        Ok(())
    }

    /// Delete a file.
    pub fn delete_file(&self, path: impl AsRef<Path>) -> VaultResult<()> {
        self.ensure_initialized()?;
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// Read raw bytes from a file.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> VaultResult<Vec<u8>> {
        self.ensure_initialized()?;

        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Write raw bytes (atomic write via rename).
    pub fn write_bytes(&self, path: impl AsRef<Path>, data: &[u8]) -> VaultResult<()> {
        self.ensure_initialized()?;
        self.replace_atomically(path.as_ref(), |file| {
            file.write_all(data)?;
            Ok(())
        })
    }

    /// Stage content in a fresh, exclusively created file outside the vault,
    /// then rename it over `path`.
    ///
    /// The rename replaces whatever entry sits at `path` and never follows it.
    fn replace_atomically<F>(&self, path: &Path, write: F) -> VaultResult<()>
    where
        F: FnOnce(&mut File) -> VaultResult<()>,
    {
        let mut staged = NamedTempFile::new_in(self.paths.staging_dir())?;
        write(staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| VaultError::from(e.error))?;
        Ok(())
    }

    // ========== JSON documents (ledger) ==========

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> VaultResult<T> {
        self.ensure_initialized()?;

        let file = File::open(path.as_ref())?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(value)
    }

    /// Write a JSON file (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> VaultResult<()> {
        self.ensure_initialized()?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.replace_atomically(path, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            Ok(())
        })
    }
}
