//! Workspace-relative path handling.

use std::path::{Component, Path, PathBuf};

/// Normalize a model-provided path into a safe workspace-relative path.
///
/// Leading `./` segments are dropped. Absolute paths, `..` components and
/// empty paths are rejected.
pub fn normalize_relative(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("path is empty".to_string());
    }
    let mut normalized = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("'{trimmed}' escapes the workspace"));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("'{trimmed}' must be relative to the workspace"));
            }
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(format!("'{trimmed}' does not name a path"));
    }
    Ok(normalized)
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_current_dir_segments() {
        let path = normalize_relative("./src/./main.py").expect("normalize");
        assert_eq!(to_slash(&path), "src/main.py");
    }

    #[test]
    fn normalize_rejects_escapes_and_absolute_paths() {
        assert!(normalize_relative("../outside.py").is_err());
        assert!(normalize_relative("src/../../x").is_err());
        assert!(normalize_relative("/etc/passwd").is_err());
        assert!(normalize_relative("   ").is_err());
        assert!(normalize_relative("./").is_err());
    }
}
