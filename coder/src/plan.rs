//! Orchestration for the planning phase.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::agents::AgentConfig;
use crate::agents::planner::PlannerAgent;
use crate::core::types::{PlanDocument, PlanningRecord};
use crate::io::config::CoderConfig;
use crate::io::layout::WorkspacePaths;
use crate::io::llm::LanguageModel;
use crate::io::persist::Persister;
use crate::io::prompt::{PlanPrompt, RelevantPathsPrompt};
use crate::io::scanner::scan;
use crate::io::store::{to_pretty_json, write_planning_log};

/// Result of a planning run.
#[derive(Debug, Clone)]
pub struct PlanningOutcome {
    pub plan: PlanDocument,
    pub record: PlanningRecord,
}

/// Scan the workspace, ask for relevant paths, draft the plan and persist it.
///
/// The scan runs first, so a missing ignore file fails before any model call.
/// An existing plan is overwritten.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run_planning<M: LanguageModel, P: Persister>(
    paths: &WorkspacePaths,
    config: &CoderConfig,
    model: &M,
    persister: &P,
    goal: &str,
) -> Result<PlanningOutcome> {
    let file_structure = scan(&paths.root, &paths.ignore_path, &[paths.log_dir_name.as_str()])?;
    info!(entries = file_structure.len(), "workspace scanned");
    paths.ensure_log_dirs()?;

    let planner = PlannerAgent::new(AgentConfig::new(config, paths), paths.reserved_names());

    let relevant = planner
        .select_relevant_paths(
            model,
            &RelevantPathsPrompt {
                goal: goal.to_string(),
                file_structure: file_structure.clone(),
            },
        )
        .context("select relevant paths")?;
    info!(relevant = relevant.value.len(), "relevant paths selected");

    let drafted = planner
        .draft_plan(
            model,
            &PlanPrompt {
                goal: goal.to_string(),
                file_structure: file_structure.clone(),
                relevant_paths: relevant.value.clone(),
            },
        )
        .context("draft plan")?;

    let plan_relative = paths.plan_relative();
    persister
        .write_file(&plan_relative, &to_pretty_json(&drafted.value)?)
        .with_context(|| format!("persist plan {plan_relative}"))?;
    info!(steps = drafted.value.plan.len(), path = %plan_relative, "plan persisted");

    let record = PlanningRecord {
        goal: goal.to_string(),
        file_structure,
        relevant_paths: relevant.value,
        relevant_paths_response: relevant.raw,
        plan_response: drafted.raw,
        plan_path: plan_relative,
        steps: drafted.value.plan.len(),
    };
    write_planning_log(&paths.planning_log_path, &record)?;

    Ok(PlanningOutcome {
        plan: drafted.value,
        record,
    })
}
