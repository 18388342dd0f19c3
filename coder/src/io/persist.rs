//! File persistence capability bound to a workspace root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::path::{normalize_relative, to_slash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistKind {
    File,
    Directory,
}

/// What a persistence call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistReport {
    /// Normalized workspace-relative path.
    pub path: String,
    pub kind: PersistKind,
    pub bytes: usize,
}

impl PersistReport {
    pub fn describe(&self) -> String {
        match self.kind {
            PersistKind::File => format!("wrote {} bytes to {}", self.bytes, self.path),
            PersistKind::Directory => format!("created directory {}", self.path),
        }
    }
}

/// Abstraction over the "persist text at path" effect.
pub trait Persister {
    /// Write `contents` at a workspace-relative path, creating parents.
    fn write_file(&self, path: &str, contents: &str) -> Result<PersistReport>;
    /// Create a workspace-relative directory (and parents).
    fn create_dir(&self, path: &str) -> Result<PersistReport>;
}

/// Persister that writes directly under a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePersister {
    root: PathBuf,
}

impl WorkspacePersister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<(PathBuf, String)> {
        let relative = normalize_relative(path).map_err(|reason| anyhow!("refusing to persist: {reason}"))?;
        Ok((self.root.join(&relative), to_slash(&relative)))
    }
}

impl Persister for WorkspacePersister {
    #[instrument(skip_all, fields(path = %path, bytes = contents.len()))]
    fn write_file(&self, path: &str, contents: &str) -> Result<PersistReport> {
        let (target, relative) = self.resolve(path)?;
        if target.is_dir() {
            return Err(anyhow!("cannot write file over directory {}", target.display()));
        }
        write_atomic(&target, contents)?;
        debug!(target = %target.display(), "file persisted");
        Ok(PersistReport {
            path: relative,
            kind: PersistKind::File,
            bytes: contents.len(),
        })
    }

    #[instrument(skip_all, fields(path = %path))]
    fn create_dir(&self, path: &str) -> Result<PersistReport> {
        let (target, relative) = self.resolve(path)?;
        fs::create_dir_all(&target)
            .with_context(|| format!("create directory {}", target.display()))?;
        debug!(target = %target.display(), "directory persisted");
        Ok(PersistReport {
            path: relative,
            kind: PersistKind::Directory,
            bytes: 0,
        })
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
