//! Per-project secret bundles.
//!
//! A bundle is the complete set of secrets for one project, serialized as
//! JSON and stored as a single encrypted unit. Secret keys are unique per
//! bundle; all mutation goes through [`ProjectBundle::upsert`] and
//! [`ProjectBundle::remove`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::constants;

/// One named secret value with its group label and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub key: String,
    pub value: String,
    pub group: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// All secrets for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBundle {
    pub project: String,
    pub path: PathBuf,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

impl ProjectBundle {
    /// An empty bundle for `project` rooted at `path`.
    pub fn new(project: &str, path: &Path) -> Self {
        Self {
            project: project.to_string(),
            path: path.to_path_buf(),
            secrets: Vec::new(),
        }
    }

    /// Look up a secret by key.
    pub fn get(&self, key: &str) -> Option<&Secret> {
        self.secrets.iter().find(|s| s.key == key)
    }

    /// Insert or update a secret.
    ///
    /// An existing key gets its value overwritten, its group replaced only
    /// when a non-empty `group` was supplied, and `updated_at` bumped. A new
    /// key is appended with both timestamps set to now; when no group was
    /// supplied one is inferred from the key prefix.
    pub fn upsert(&mut self, key: &str, value: &str, group: Option<&str>) -> Upsert {
        let now = Utc::now();
        if let Some(existing) = self.secrets.iter_mut().find(|s| s.key == key) {
            existing.value = value.to_string();
            if let Some(group) = group.filter(|g| !g.is_empty()) {
                existing.group = group.to_string();
            }
            existing.updated_at = now;
            return Upsert::Updated;
        }

        let group = match group.filter(|g| !g.is_empty()) {
            Some(group) => group.to_string(),
            None => detect_group(key).to_string(),
        };
        self.secrets.push(Secret {
            key: key.to_string(),
            value: value.to_string(),
            group,
            created_at: now,
            updated_at: now,
        });
        Upsert::Created
    }

    /// Remove the first secret with a matching key; reports whether one
    /// was found. Removing the last secret never deletes the bundle file.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.secrets.iter().position(|s| s.key == key) {
            Some(idx) => {
                self.secrets.remove(idx);
                true
            }
            None => false,
        }
    }

    /// The newest `updated_at` across all secrets, if any.
    ///
    /// Sync treats `None` as older than any timestamp.
    pub fn latest_update(&self) -> Option<DateTime<Utc>> {
        self.secrets.iter().map(|s| s.updated_at).max()
    }
}

/// Classify a key into a group via the ordered prefix rule table.
///
/// Matching is case-insensitive; the first rule whose prefix matches wins.
pub fn detect_group(key: &str) -> &'static str {
    let upper = key.trim().to_ascii_uppercase();
    for (prefix, group) in constants::GROUP_RULES {
        if upper.starts_with(prefix) {
            return group;
        }
    }
    constants::FALLBACK_GROUP
}

/// Sanitize a project name into its storage key.
///
/// Trims whitespace, maps every character outside `[A-Za-z0-9_-]` to `-`,
/// strips leading/trailing dashes, and lowercases. Empty or all-invalid
/// input maps to the fixed default project name. Idempotent and total.
pub fn sanitize_project_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return constants::DEFAULT_PROJECT.to_string();
    }
    let replaced: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let stripped = replaced.trim_matches('-');
    if stripped.is_empty() {
        constants::DEFAULT_PROJECT.to_string()
    } else {
        stripped.to_ascii_lowercase()
    }
}

/// File name for a project's ciphertext blob, locally and remotely.
pub fn bundle_file_name(project: &str) -> String {
    format!(
        "{}{}",
        sanitize_project_name(project),
        constants::BUNDLE_SUFFIX
    )
}
