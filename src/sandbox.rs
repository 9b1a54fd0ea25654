// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Path Sandbox
//!
//! Confines every path handed to the filesystem to the root boundary.
//!
//! Resolution joins the input onto the current directory, collapses `.` and
//! `..` lexically, then canonicalizes the longest existing prefix so that
//! symbolic links are followed before the containment check. Containment is
//! decided with [`Path::starts_with`], which compares whole components:
//! `/data/root-evil` is not inside `/data/root`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Outcome of a successful directory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryChange {
    Moved,
    /// `..` was requested at the root; nothing changed.
    AlreadyAtRoot,
}

/// Reject names that are not a single plain path component.
pub fn validate_file_name(name: &str) -> VaultResult<()> {
    if name.trim().is_empty() {
        return Err(VaultError::InvalidArgument("name must not be empty".to_string()));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(VaultError::InvalidArgument(format!(
            "name must not contain path separators: {name}"
        )));
    }
    if name == "." || name == ".." {
        return Err(VaultError::InvalidArgument(format!(
            "name must not be a relative directory: {name}"
        )));
    }
    Ok(())
}

/// Collapse `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
///
/// A dangling symbolic link anywhere in the existing prefix is rejected,
/// since writing through it would land wherever it points.
fn canonicalize_existing_prefix(path: &Path) -> VaultResult<PathBuf> {
    for ancestor in path.ancestors() {
        if fs::symlink_metadata(ancestor).is_err() {
            continue;
        }
        let base = fs::canonicalize(ancestor).map_err(|_| {
            VaultError::OutOfBounds(format!(
                "unresolvable link: {}",
                ancestor.display()
            ))
        })?;
        let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
        // joining an empty tail would add a trailing separator
        if rest.as_os_str().is_empty() {
            return Ok(base);
        }
        return Ok(base.join(rest));
    }
    Ok(path.to_path_buf())
}

/// Root boundary plus the current directory pointer.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    current: PathBuf,
}

impl Sandbox {
    /// Create a sandbox over an existing directory.
    pub fn new(root: impl AsRef<Path>) -> VaultResult<Self> {
        let root = fs::canonicalize(root.as_ref()).map_err(|e| {
            VaultError::NotFound(format!("root {}: {e}", root.as_ref().display()))
        })?;
        if !root.is_dir() {
            return Err(VaultError::NotADirectory(root.display().to_string()));
        }
        Ok(Self {
            current: root.clone(),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> &Path {
        &self.current
    }

    /// Move back to the root.
    pub fn reset(&mut self) {
        self.current = self.root.clone();
    }

    /// Resolve `input` against the current directory.
    ///
    /// # Errors
    /// `OutOfBounds` unless the fully resolved path lies inside the root.
    pub fn resolve(&self, input: &str) -> VaultResult<PathBuf> {
        let joined = self.current.join(input);
        let normalized = normalize_lexically(&joined);
        let resolved = canonicalize_existing_prefix(&normalized)?;

        if !resolved.starts_with(&self.root) {
            tracing::warn!(input, "Rejected path outside the root boundary");
            return Err(VaultError::OutOfBounds(input.to_string()));
        }
        Ok(resolved)
    }

    /// Change the current directory.
    ///
    /// `/` goes back to the root, `..` at the root is a reported no-op, and
    /// anything else must resolve to an existing directory.
    pub fn change_directory(&mut self, input: &str) -> VaultResult<DirectoryChange> {
        match input.trim() {
            "" => Err(VaultError::InvalidArgument("directory must not be empty".to_string())),
            "/" => {
                self.reset();
                Ok(DirectoryChange::Moved)
            }
            ".." if self.current == self.root => Ok(DirectoryChange::AlreadyAtRoot),
            ".." => {
                if let Some(parent) = self.current.parent() {
                    self.current = parent.to_path_buf();
                }
                Ok(DirectoryChange::Moved)
            }
            other => {
                let target = self.resolve(other)?;
                if !target.exists() {
                    return Err(VaultError::NotFound(other.to_string()));
                }
                if !target.is_dir() {
                    return Err(VaultError::NotADirectory(other.to_string()));
                }
                self.current = target;
                Ok(DirectoryChange::Moved)
            }
        }
    }

    /// Root-relative, `/`-separated key of a resolved path. Empty for the root.
    pub fn relative_key(&self, path: &Path) -> VaultResult<String> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| VaultError::OutOfBounds(path.display().to_string()))?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }

    /// Current directory as shown to the user: `/` or `/a/b`.
    pub fn pwd(&self) -> String {
        match self.relative_key(&self.current) {
            Ok(key) if !key.is_empty() => format!("/{key}"),
            _ => "/".to_string(),
        }
    }
}
