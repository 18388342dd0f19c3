//! Dependency loading for execution steps.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::core::path::normalize_relative;

/// One dependency as handed to the generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyContent {
    /// Path exactly as listed in the plan.
    pub path: String,
    /// File contents, or a sentinel line when the file could not be read.
    pub content: String,
    pub found: bool,
}

impl DependencyContent {
    pub fn found(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            found: true,
        }
    }

    /// `"<path> Not found"`.
    pub fn not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            content: format!("{path} Not found"),
            path,
            found: false,
        }
    }

    /// `"<path> Unreadable (<reason>)"`.
    pub fn unreadable(path: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let path = path.into();
        Self {
            content: format!("{path} Unreadable ({})", reason.as_ref()),
            path,
            found: false,
        }
    }
}

/// Read each dependency relative to `root`, in the given order.
///
/// Never fails: a missing file yields a `Not found` sentinel and any other
/// problem an `Unreadable` sentinel, so the step can proceed.
pub fn read_dependencies(root: &Path, dependencies: &[String]) -> Vec<DependencyContent> {
    dependencies
        .iter()
        .map(|raw| read_dependency(root, raw))
        .collect()
}

fn read_dependency(root: &Path, raw: &str) -> DependencyContent {
    let relative = match normalize_relative(raw) {
        Ok(relative) => relative,
        Err(reason) => {
            warn!(path = raw, reason = %reason, "dependency path rejected");
            return DependencyContent::unreadable(raw, reason);
        }
    };
    let path = root.join(relative);
    if path.is_dir() {
        return DependencyContent::unreadable(raw, "is a directory");
    }
    match fs::read_to_string(&path) {
        Ok(content) => DependencyContent::found(raw, content),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = raw, "dependency not found");
            DependencyContent::not_found(raw)
        }
        Err(err) => {
            warn!(path = raw, err = %err, "dependency unreadable");
            DependencyContent::unreadable(raw, err.to_string())
        }
    }
}
