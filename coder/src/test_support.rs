//! Test-only helpers: a scripted model, scratch workspaces and plan builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use serde_json::json;
use tempfile::TempDir;

use crate::core::types::{ExtraInfo, PlanDocument, Step, StepKind};
use crate::io::config::CoderConfig;
use crate::io::layout::WorkspacePaths;
use crate::io::llm::{CompletionRequest, LanguageModel};
use crate::io::persist::WorkspacePersister;

/// Model that replays queued replies in order and records every request.
///
/// Running out of replies is an error, so a test notices unexpected calls.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }

    /// The request sent under `label`, if any.
    pub fn request(&self, label: &str) -> Option<CompletionRequest> {
        self.requests
            .borrow()
            .iter()
            .find(|request| request.label == label)
            .cloned()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply left for '{}'", request.label))
    }
}

/// Scratch workspace with default config and a workspace-bound persister.
pub struct TestWorkspace {
    temp: TempDir,
    pub config: CoderConfig,
    pub paths: WorkspacePaths,
    pub persister: WorkspacePersister,
}

impl TestWorkspace {
    /// Empty workspace without an ignore file.
    pub fn bare() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = CoderConfig::default();
        let paths = WorkspacePaths::new(temp.path(), &config);
        let persister = WorkspacePersister::new(temp.path());
        Self {
            temp,
            config,
            paths,
            persister,
        }
    }

    /// Workspace with a `.caignore` holding `ignore`.
    pub fn new(ignore: &str) -> Self {
        let workspace = Self::bare();
        workspace.write(".caignore", ignore);
        workspace
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("read file")
    }

    pub fn write_plan(&self, plan: &PlanDocument) {
        fs::create_dir_all(&self.paths.log_dir).expect("create log dir");
        let mut buf = serde_json::to_string_pretty(plan).expect("serialize plan");
        buf.push('\n');
        fs::write(&self.paths.plan_path, buf).expect("write plan");
    }
}

/// File step with no dependencies.
pub fn step(n: u32, save_path: &str) -> Step {
    Step {
        step: n,
        dependencies: Vec::new(),
        modification: format!("step {n} modification"),
        save_path: save_path.to_string(),
        extra_info: ExtraInfo {
            kind: Some(StepKind::Create),
            ..ExtraInfo::default()
        },
    }
}

pub fn step_with_deps(n: u32, save_path: &str, dependencies: &[&str]) -> Step {
    Step {
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        ..step(n, save_path)
    }
}

pub fn directory_step(n: u32, save_path: &str) -> Step {
    Step {
        modification: String::new(),
        extra_info: ExtraInfo {
            kind: Some(StepKind::Directory),
            ..ExtraInfo::default()
        },
        ..step(n, save_path)
    }
}

pub fn plan(steps: Vec<Step>) -> PlanDocument {
    PlanDocument { plan: steps }
}

/// A generation reply wrapping `content` in a fenced block.
pub fn fenced(lang: &str, content: &str) -> String {
    format!("Here is the file:\n```{lang}\n{content}```\n")
}

/// A definitions reply declaring one function and the file itself.
pub fn function_definitions(path: &str, function: &str) -> String {
    let body = json!({
        "classes": [],
        "functions": [{"location": path, "name": function, "args": [], "docstring": format!("{function} docs")}],
        "files": [{"path": path, "description": format!("defines {function}")}]
    });
    format!("```json\n{body}\n```")
}
