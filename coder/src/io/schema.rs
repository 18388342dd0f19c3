//! Embedded JSON schemas for structured model replies and on-disk documents.

use anyhow::{Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

const PLAN_SCHEMA: &str = include_str!("../../schemas/plan.schema.json");
const DEFINITIONS_SCHEMA: &str = include_str!("../../schemas/definitions.schema.json");
const RELEVANT_PATHS_SCHEMA: &str = include_str!("../../schemas/relevant_paths.schema.json");

/// The structured documents the runner validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Plan,
    Definitions,
    RelevantPaths,
}

impl SchemaKind {
    pub fn source(self) -> &'static str {
        match self {
            SchemaKind::Plan => PLAN_SCHEMA,
            SchemaKind::Definitions => DEFINITIONS_SCHEMA,
            SchemaKind::RelevantPaths => RELEVANT_PATHS_SCHEMA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Plan => "plan",
            SchemaKind::Definitions => "definitions",
            SchemaKind::RelevantPaths => "relevant_paths",
        }
    }
}

/// Validate `instance` against the embedded schema.
///
/// The outer error means the embedded schema itself is broken; the inner
/// list holds one message per violation (empty when valid).
pub fn violations(kind: SchemaKind, instance: &Value) -> Result<Vec<String>> {
    let schema: Value = serde_json::from_str(kind.source())
        .map_err(|err| anyhow!("parse {} schema: {err}", kind.as_str()))?;
    let compiled =
        validator_for(&schema).map_err(|err| anyhow!("invalid {} schema: {err}", kind.as_str()))?;
    if compiled.is_valid(instance) {
        return Ok(Vec::new());
    }
    Ok(compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect())
}
