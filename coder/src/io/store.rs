//! Load/save helpers for the plan, registry and run logs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::plan::validate_plan;
use crate::core::types::{Definitions, ExecutionRecord, PlanDocument, PlanningRecord};
use crate::error::CoderError;
use crate::io::persist::write_atomic;
use crate::io::schema::{SchemaKind, violations};

/// Serialize as pretty JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    Ok(buf)
}

/// Write pretty JSON atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let buf = to_pretty_json(value)?;
    write_atomic(path, &buf).with_context(|| format!("write json {}", path.display()))
}

/// Check a plan value against the schema and the plan invariants.
pub fn check_plan_value(value: &Value, reserved: &[String]) -> Result<PlanDocument> {
    let errors = violations(SchemaKind::Plan, value)?;
    if !errors.is_empty() {
        return Err(CoderError::InvalidPlan(errors).into());
    }
    let plan: PlanDocument = serde_json::from_value(value.clone())
        .map_err(|err| CoderError::InvalidPlan(vec![err.to_string()]))?;
    let errors = validate_plan(&plan, reserved);
    if !errors.is_empty() {
        return Err(CoderError::InvalidPlan(errors).into());
    }
    Ok(plan)
}

/// Load and validate the plan from disk (schema + invariants).
///
/// `reserved` names the top-level entries no step may write to.
pub fn load_plan(path: &Path, reserved: &[String]) -> Result<PlanDocument> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read plan {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse plan {}", path.display()))?;
    let plan = check_plan_value(&value, reserved)
        .with_context(|| format!("load plan {}", path.display()))?;
    debug!(steps = plan.plan.len(), path = %path.display(), "loaded plan");
    Ok(plan)
}

/// Load the registry, creating it with empty arrays when absent.
pub fn load_or_init_definitions(path: &Path) -> Result<Definitions> {
    if !path.exists() {
        let empty = Definitions::default();
        write_definitions(path, &empty)?;
        info!(path = %path.display(), "initialized empty definitions registry");
        return Ok(empty);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read registry {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse registry {}", path.display()))
}

pub fn write_definitions(path: &Path, definitions: &Definitions) -> Result<()> {
    write_json(path, definitions)
}

pub fn write_execution_log(path: &Path, records: &[ExecutionRecord]) -> Result<()> {
    write_json(path, &records)
}

pub fn write_planning_log(path: &Path, record: &PlanningRecord) -> Result<()> {
    write_json(path, record)
}
