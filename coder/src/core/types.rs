//! Shared document types for the plan/execute protocol.
//!
//! These types define the JSON contracts between the planner, the executor and
//! the files they leave in the workspace. They carry no I/O.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The Plan Document written by the planner and consumed by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub plan: Vec<Step>,
}

/// One unit of planned work: read some files, produce content, save it to one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Execution order key. Unique within a plan, starts at 1.
    pub step: u32,
    /// Workspace-relative files whose contents are loaded before generation.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-text description of the change.
    pub modification: String,
    /// Workspace-relative destination of the step's output.
    pub save_path: String,
    #[serde(default)]
    pub extra_info: ExtraInfo,
}

impl Step {
    pub fn kind(&self) -> Option<StepKind> {
        self.extra_info.kind
    }

    pub fn creates_directory(&self) -> bool {
        self.extra_info.kind == Some(StepKind::Directory)
    }
}

/// What a step does with its save target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Create,
    Add,
    Modify,
    Directory,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Create => "create",
            StepKind::Add => "add",
            StepKind::Modify => "modify",
            StepKind::Directory => "directory",
        }
    }
}

/// Auxiliary directives attached to a step.
///
/// `type` and `structure` are typed; every other key is kept as-is so the
/// model may pass extra hints through to the generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraInfo {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StepKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ExtraInfo {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.structure.is_none() && self.other.is_empty()
    }
}

/// Outline of the symbols a step intends to introduce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default)]
    pub classes: Vec<Value>,
    #[serde(default)]
    pub functions: Vec<Value>,
    #[serde(default)]
    pub constants: Vec<Value>,
}

/// Cumulative record of the public surface introduced by executed steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub files: Vec<FileDef>,
}

impl Definitions {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty() && self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.functions.len() + self.files.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub location: String,
    pub name: String,
    #[serde(rename = "init args", default)]
    pub init_args: Vec<ArgDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub docstring: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgDef>,
    #[serde(default)]
    pub docstring: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// File that defines the function.
    #[serde(default)]
    pub location: String,
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgDef>,
    #[serde(default)]
    pub docstring: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    /// `None` when the argument has no default. An explicit `null` default
    /// is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDef {
    pub path: String,
    #[serde(default)]
    pub description: String,
}

/// Counts produced by one registry merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Entries whose key was not yet recorded.
    pub added: usize,
    /// Entries that replaced an existing entry with the same key.
    pub updated: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    pub total_files: usize,
}

/// Everything observed while executing one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub step: u32,
    pub save_path: String,
    pub extra_info: ExtraInfo,
    /// Content actually persisted at `save_path`. `None` for directory steps.
    pub generated_content: Option<String>,
    /// Raw text of the generation reply.
    pub generation_response: Option<String>,
    /// Description of the filesystem effect.
    pub persist_report: String,
    /// Raw text of the definitions reply.
    pub definitions_response: Option<String>,
    pub registry_update: MergeSummary,
}

/// Everything observed while planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRecord {
    pub goal: String,
    pub file_structure: Vec<String>,
    pub relevant_paths: Vec<String>,
    pub relevant_paths_response: String,
    pub plan_response: String,
    pub plan_path: String,
    pub steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_defaults_missing_optional_fields() {
        let step: Step = serde_json::from_value(json!({
            "step": 1,
            "modification": "add a module",
            "save_path": "src/lib.py"
        }))
        .expect("parse step");

        assert!(step.dependencies.is_empty());
        assert!(step.extra_info.is_empty());
        assert_eq!(step.kind(), None);
    }

    #[test]
    fn extra_info_keeps_unknown_keys() {
        let info: ExtraInfo = serde_json::from_value(json!({
            "type": "directory",
            "note": "keep me",
            "structure": {"classes": [{"name": "A"}]}
        }))
        .expect("parse extra info");

        assert_eq!(info.kind, Some(StepKind::Directory));
        assert_eq!(info.other.get("note"), Some(&json!("keep me")));
        let structure = info.structure.as_ref().expect("structure");
        assert_eq!(structure.classes.len(), 1);
        assert!(structure.constants.is_empty());

        let back = serde_json::to_value(&info).expect("serialize");
        assert_eq!(back["note"], "keep me");
        assert_eq!(back["type"], "directory");
    }

    #[test]
    fn class_def_uses_spaced_init_args_key() {
        let class: ClassDef = serde_json::from_value(json!({
            "location": "pkg/model.py",
            "name": "Model",
            "init args": [{"name": "size", "type": "int", "default": 3}],
            "methods": [],
            "docstring": "A model."
        }))
        .expect("parse class");

        assert_eq!(class.init_args[0].ty, "int");
        assert_eq!(class.init_args[0].default, Some(json!(3)));
        let back = serde_json::to_value(&class).expect("serialize");
        assert!(back.get("init args").is_some());
    }

    #[test]
    fn null_default_survives_round_trip() {
        let args: Vec<ArgDef> = serde_json::from_value(json!([
            {"name": "x", "type": "Optional[int]", "default": null},
            {"name": "y", "type": "int"}
        ]))
        .expect("parse args");

        assert_eq!(args[0].default, Some(Value::Null));
        assert_eq!(args[1].default, None);
        let back = serde_json::to_value(&args).expect("serialize");
        assert_eq!(
            back,
            json!([
                {"name": "x", "type": "Optional[int]", "default": null},
                {"name": "y", "type": "int"}
            ])
        );
    }
}
