//! Canonical paths inside a mission workspace.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::io::config::{CONFIG_FILE_NAME, CoderConfig};

pub const PLAN_FILE: &str = "plan.json";
pub const DEFINITIONS_FILE: &str = "extra_definitions.json";
pub const EXECUTION_LOG_FILE: &str = "execution_log.json";
pub const PLANNING_LOG_FILE: &str = "planning_log.json";
pub const TRANSCRIPTS_DIR: &str = "transcripts";

/// All paths the planner and executor read or write for one workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub ignore_path: PathBuf,
    /// Log directory name, relative to `root`.
    pub log_dir_name: String,
    pub log_dir: PathBuf,
    pub plan_path: PathBuf,
    pub definitions_path: PathBuf,
    pub execution_log_path: PathBuf,
    pub planning_log_path: PathBuf,
    pub transcripts_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>, config: &CoderConfig) -> Self {
        let root = root.into();
        let log_dir_name = config.log_dir.trim().to_string();
        let log_dir = root.join(&log_dir_name);
        Self {
            ignore_path: root.join(config.ignore_file.trim()),
            plan_path: log_dir.join(PLAN_FILE),
            definitions_path: log_dir.join(DEFINITIONS_FILE),
            execution_log_path: log_dir.join(EXECUTION_LOG_FILE),
            planning_log_path: log_dir.join(PLANNING_LOG_FILE),
            transcripts_dir: log_dir.join(TRANSCRIPTS_DIR),
            root,
            log_dir_name,
            log_dir,
        }
    }

    /// Workspace-relative location of the plan, as handed to the persister.
    pub fn plan_relative(&self) -> String {
        format!("{}/{}", self.log_dir_name, PLAN_FILE)
    }

    /// Top-level names a plan step may not write to.
    pub fn reserved_names(&self) -> Vec<String> {
        let mut names = vec![self.log_dir_name.clone()];
        if let Some(name) = self.ignore_path.file_name() {
            names.push(name.to_string_lossy().into_owned());
        }
        names.push(CONFIG_FILE_NAME.to_string());
        names
    }

    /// Create the log and transcript directories.
    pub fn ensure_log_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.transcripts_dir)
            .with_context(|| format!("create log directory {}", self.transcripts_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable() {
        let paths = WorkspacePaths::new("/ws", &CoderConfig::default());

        assert_eq!(paths.ignore_path, PathBuf::from("/ws/.caignore"));
        assert_eq!(paths.plan_path, PathBuf::from("/ws/ca_logs/plan.json"));
        assert_eq!(
            paths.definitions_path,
            PathBuf::from("/ws/ca_logs/extra_definitions.json")
        );
        assert!(paths.execution_log_path.ends_with("ca_logs/execution_log.json"));
        assert!(paths.planning_log_path.ends_with("ca_logs/planning_log.json"));
        assert!(paths.transcripts_dir.ends_with("ca_logs/transcripts"));
        assert_eq!(paths.plan_relative(), "ca_logs/plan.json");
        assert_eq!(
            paths.reserved_names(),
            vec!["ca_logs", ".caignore", ".caconfig.toml"]
        );
    }

    #[test]
    fn ensure_log_dirs_creates_transcripts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(temp.path(), &CoderConfig::default());
        paths.ensure_log_dirs().expect("create");
        assert!(paths.transcripts_dir.is_dir());
    }
}
