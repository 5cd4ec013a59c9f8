//! Configuration file management.
//!
//! Handles reading and writing the `config.json` document under the cloak
//! home directory. The config carries public metadata only — machine
//! identity, project registry, trusted recipients, remote linkage — never
//! plaintext secrets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::core::identity::KeyStorage;
use crate::core::types::PublicKey;
use crate::error::{ConfigError, Result};

/// Machine record created once at initialization.
///
/// The id is random and immutable for the lifetime of the installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub public_key: PublicKey,
    pub added_at: DateTime<Utc>,
}

/// Remote container linkage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// User preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub export_format: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            export_format: "env".to_string(),
        }
    }
}

/// Top-level configuration document.
///
/// Field order is the serialized order; collections are always materialized
/// on load so downstream code never sees absent maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<Machine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_storage: Option<KeyStorage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Project name -> canonical path.
    #[serde(default)]
    pub projects: BTreeMap<String, PathBuf>,
    /// Canonical path -> project name (reverse of `projects`).
    #[serde(default)]
    pub path_projects: BTreeMap<PathBuf, String>,
    /// Trusted recipient public keys. Grows by union, never shrinks
    /// automatically, so every ciphertext ever produced stays decryptable
    /// on every device that has joined.
    #[serde(default)]
    pub recipients: BTreeSet<PublicKey>,
    #[serde(default)]
    pub remote: RemoteLink,
    #[serde(default)]
    pub prefs: Preferences,
}

impl Config {
    /// A fresh configuration with default values and current timestamps.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: constants::CONFIG_VERSION,
            created_at: now,
            updated_at: now,
            machine: None,
            key_storage: None,
            key_file: None,
            projects: BTreeMap::new(),
            path_projects: BTreeMap::new(),
            recipients: BTreeSet::new(),
            remote: RemoteLink::default(),
            prefs: Preferences::default(),
        }
    }

    /// Load the configuration from `path`.
    ///
    /// A missing file yields defaults; any other read failure or malformed
    /// JSON is an error.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config: Self = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(
            projects = config.projects.len(),
            recipients = config.recipients.len(),
            "config loaded"
        );

        Ok(config)
    }

    /// Save the configuration to `path`.
    ///
    /// Stamps `updated_at` and writes with owner-only permissions via a
    /// temporary file and rename, so a crash never leaves a truncated
    /// config behind.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving config");

        self.updated_at = Utc::now();
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        write_private(path, contents.as_bytes()).map_err(ConfigError::Write)?;

        Ok(())
    }

    /// Whether initialization has completed (machine record + storage mode).
    pub fn is_initialized(&self) -> bool {
        self.machine.is_some() && self.key_storage.is_some()
    }

    /// Register a name <-> path mapping for a project.
    pub fn register_project(&mut self, name: &str, path: &Path) {
        if name.is_empty() {
            return;
        }
        self.projects.insert(name.to_string(), path.to_path_buf());
        self.path_projects.insert(path.to_path_buf(), name.to_string());
    }

    /// Union public keys into the trusted recipient set.
    ///
    /// Entries are trimmed; empty lines are dropped. The backing set keeps
    /// the collection deduplicated and sorted.
    pub fn add_recipients<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref().trim();
            if !key.is_empty() {
                self.recipients.insert(key.to_string());
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a file readable only by the owner, atomically.
///
/// Writes to a sibling temporary file and renames it over the target, so
/// concurrent invocations still resolve to last-writer-wins on whole files.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp, path)
}
