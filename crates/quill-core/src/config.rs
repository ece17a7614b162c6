// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Instance configuration for one Quill deployment.
//!
//! One document, one instance, one config file. The provisioning CLI writes
//! the file once; the saver daemon reads it at startup and never mutates it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Retention rules bounding how many backups persist.
///
/// The two axes are independent: the count cap and the age cutoff are
/// applied as separate pruning passes, never combined into one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Backup count cap: `-1` disables backup creation entirely, `0` keeps
    /// an unlimited number, `> 0` keeps that many newest backups.
    pub max_count: i64,
    /// Age cutoff in days: `0` disables age-based deletion, `> 0` deletes
    /// any backup older than this many days.
    pub max_age_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_count: 200,
            max_age_days: 0,
        }
    }
}

impl RetentionPolicy {
    /// Whether backup creation is switched off (`max_count` negative).
    pub fn backups_disabled(&self) -> bool {
        self.max_count < 0
    }
}

/// Error type for config load/store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading or writing the config file.
    #[error("[CONFIG_IO] {0}")]
    Io(#[from] io::Error),
    /// The config file is not valid JSON for [`InstanceConfig`].
    #[error("[CONFIG_PARSE] {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for one saver instance, as written by `quill-deploy`.
///
/// Relative paths are resolved against the directory containing the config
/// file, so an instance directory stays relocatable as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// The document file this instance persists.
    pub document: PathBuf,
    /// Directory receiving backup snapshots.
    pub backup_dir: PathBuf,
    /// Address the saver daemon listens on.
    pub listen: SocketAddr,
    /// Backup retention rules.
    #[serde(default)]
    pub retention: RetentionPolicy,
}

impl InstanceConfig {
    /// Load a config from `path`, resolving relative paths against the
    /// config file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it does not deserialize.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        let mut config: Self = serde_json::from_slice(&bytes)?;
        if let Some(base) = path.parent() {
            config.document = resolve(base, &config.document);
            config.backup_dir = resolve(base, &config.backup_dir);
        }
        Ok(config)
    }

    /// Serialize and persist this config to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure.
    pub fn store(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
