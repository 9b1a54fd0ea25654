// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy shared by every component of the file store.
//!
//! Low-level failures (I/O, redb, serde, ring) are mapped into [`VaultError`]
//! at the component boundary. Control flow is driven by [`ErrorKind`], never
//! by the message text.

use std::io;

use serde::{Deserialize, Serialize};

/// Control-flow tag of a [`VaultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    NotReadable,
    NotWritable,
    InvalidArgument,
    OutOfBounds,
    PermissionDenied,
    IntegrityViolation,
    Crypto,
    Persistence,
    Unknown,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotReadable => "not_readable",
            ErrorKind::NotWritable => "not_writable",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::OutOfBounds => "out_of_bounds",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::IntegrityViolation => "integrity_violation",
            ErrorKind::Crypto => "crypto_error",
            ErrorKind::Persistence => "persistence_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether a caller may retry the operation that failed with this kind.
    ///
    /// Integrity and permission failures always fail closed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Persistence)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type for all file store operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not readable: {0}")]
    NotReadable(String),

    #[error("not writable: {0}")]
    NotWritable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("access outside the authorized root is forbidden: {0}")]
    OutOfBounds(String),

    #[error("permission denied: user {actor} cannot access {resource}")]
    PermissionDenied { actor: String, resource: String },

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("record store unavailable: {0}")]
    Persistence(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl VaultError {
    /// The taxonomy kind used for control flow and audit outcomes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VaultError::NotReadable(_) => ErrorKind::NotReadable,
            VaultError::NotWritable(_) => ErrorKind::NotWritable,
            VaultError::InvalidArgument(_) | VaultError::NotADirectory(_) => {
                ErrorKind::InvalidArgument
            }
            VaultError::OutOfBounds(_) => ErrorKind::OutOfBounds,
            VaultError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            VaultError::IntegrityViolation(_) => ErrorKind::IntegrityViolation,
            VaultError::Crypto(_) => ErrorKind::Crypto,
            VaultError::Persistence(_) => ErrorKind::Persistence,
            VaultError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn permission_denied(actor: impl Into<String>, resource: impl Into<String>) -> Self {
        VaultError::PermissionDenied {
            actor: actor.into(),
            resource: resource.into(),
        }
    }
}

impl From<io::Error> for VaultError {
    fn from(e: io::Error) -> Self {
        let msg = e.to_string();
        match e.kind() {
            io::ErrorKind::NotFound => VaultError::NotFound(msg),
            io::ErrorKind::AlreadyExists => VaultError::AlreadyExists(msg),
            io::ErrorKind::PermissionDenied => VaultError::NotWritable(msg),
            io::ErrorKind::InvalidInput => VaultError::InvalidArgument(msg),
            _ => VaultError::Unknown(msg),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Unknown(format!("serialization failed: {e}"))
    }
}

/// Result type for file store operations.
pub type VaultResult<T> = Result<T, VaultError>;
