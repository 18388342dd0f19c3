//! Workflow selection and the full plan/execute mission.

use std::str::FromStr;

use anyhow::Result;
use clap::ValueEnum;
use tracing::info;

use crate::error::CoderError;
use crate::execute::{ExecutionOutcome, run_execution};
use crate::io::config::CoderConfig;
use crate::io::layout::WorkspacePaths;
use crate::io::llm::LanguageModel;
use crate::io::persist::Persister;
use crate::plan::{PlanningOutcome, run_planning};

pub const DEFAULT_WORKFLOW: &str = "plan-execute";
/// Older selector name for the same workflow.
pub const LEGACY_WORKFLOW_ALIAS: &str = "coder_custom";

/// Agent workflows the runner knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    PlanExecute,
}

impl FromStr for Workflow {
    type Err = CoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            DEFAULT_WORKFLOW | LEGACY_WORKFLOW_ALIAS => Ok(Workflow::PlanExecute),
            other => Err(CoderError::UnknownWorkflow(other.to_string())),
        }
    }
}

/// Which phases of the workflow to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    #[default]
    All,
    /// Planning only; writes `plan.json`.
    Plan,
    /// Execution only, against an existing `plan.json`.
    Execute,
}

impl Phase {
    fn plans(self) -> bool {
        matches!(self, Phase::All | Phase::Plan)
    }

    fn executes(self) -> bool {
        matches!(self, Phase::All | Phase::Execute)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MissionOutcome {
    pub planning: Option<PlanningOutcome>,
    pub execution: Option<ExecutionOutcome>,
}

/// Run the selected phases of `workflow` for `goal`.
pub fn run_mission<M: LanguageModel, P: Persister>(
    workflow: Workflow,
    phase: Phase,
    paths: &WorkspacePaths,
    config: &CoderConfig,
    model: &M,
    persister: &P,
    goal: &str,
) -> Result<MissionOutcome> {
    info!(?workflow, ?phase, "mission started");

    let mut outcome = MissionOutcome::default();
    if phase.plans() {
        outcome.planning = Some(run_planning(paths, config, model, persister, goal)?);
    }
    if phase.executes() {
        outcome.execution = Some(run_execution(paths, config, model, persister, goal)?);
    }
    Ok(outcome)
}
