// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults. Configuration is loaded from the
//! environment once at startup and handed to [`crate::vault::SecureFileStore`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SFS_DATA_DIR` | Directory holding the vault root, ledger and record store | `./sfs-data` |
//! | `SFS_STORE_RETRIES` | Attempt ceiling for record store calls | `3` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;

use crate::storage::StoragePaths;

/// Environment variable name for the data directory.
pub const DATA_DIR_ENV: &str = "SFS_DATA_DIR";

/// Environment variable name for the record store attempt ceiling.
pub const STORE_RETRIES_ENV: &str = "SFS_STORE_RETRIES";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./sfs-data";

/// Default number of attempts for a record store call.
pub const DEFAULT_STORE_RETRIES: u32 = 3;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub data_dir: PathBuf,
    pub store_retries: u32,
    pub log_format: LogFormat,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl VaultConfig {
    /// Configuration rooted at `data_dir` with default settings.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            store_retries: DEFAULT_STORE_RETRIES,
            log_format: LogFormat::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Unparseable numeric values fall back to their defaults; a zero retry
    /// ceiling is raised to one attempt.
    pub fn from_env() -> Self {
        let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let store_retries = env::var(STORE_RETRIES_ENV)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_STORE_RETRIES)
            .max(1);
        let log_format = env::var(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Self {
            data_dir: PathBuf::from(data_dir),
            store_retries,
            log_format,
        }
    }

    /// Storage layout derived from the data directory.
    pub fn paths(&self) -> StoragePaths {
        StoragePaths::new(&self.data_dir)
    }
}
