//! Project resolution heuristics.
//!
//! Maps an optional explicit project name plus the current directory to a
//! canonical (name, path) pair. Resolution never fails except on an
//! unreadable working directory, which the caller handles.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::config::Config;
use crate::core::constants;

/// Normalize a path to an absolute, lexically cleaned form.
///
/// Relative paths are anchored at `cwd`. `.` and `..` components are
/// resolved textually; symlinks are not followed.
pub fn normalize_path(path: &Path, cwd: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(component.as_os_str());
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Resolve a project name and canonical path.
///
/// Priority order:
/// 1. explicit name — registered path if known, else bound to `cwd`;
/// 2. a `.cloak` marker file in `cwd`;
/// 3. the longest registered path that is a prefix of `cwd`;
/// 4. a package marker file in `cwd` (directory base name);
/// 5. the directory base name, or the default project for roots.
pub fn resolve(config: &Config, explicit: Option<&str>, cwd: &Path) -> (String, PathBuf) {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        if let Some(path) = config.projects.get(name) {
            return (name.to_string(), path.clone());
        }
        return (name.to_string(), cwd.to_path_buf());
    }

    if let Ok(marker) = std::fs::read_to_string(cwd.join(constants::PROJECT_MARKER)) {
        let name = marker.trim();
        if !name.is_empty() {
            debug!(name, "project pinned by marker file");
            return (name.to_string(), cwd.to_path_buf());
        }
    }

    // Most specific registered prefix wins for nested directories.
    let best = config
        .path_projects
        .iter()
        .filter(|(path, _)| cwd.starts_with(path))
        .max_by_key(|(path, _)| path.as_os_str().len());
    if let Some((path, name)) = best {
        return (name.clone(), path.clone());
    }

    for marker in constants::PROJECT_MARKERS {
        if cwd.join(marker).exists() {
            return (base_name(cwd), cwd.to_path_buf());
        }
    }

    (base_name(cwd), cwd.to_path_buf())
}

/// Directory base name, falling back to the default project for roots.
fn base_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) if !name.is_empty() => name.to_string_lossy().to_string(),
        _ => constants::DEFAULT_PROJECT.to_string(),
    }
}
