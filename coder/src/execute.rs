//! Orchestration for the execution phase.

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::agents::AgentConfig;
use crate::agents::coder::CoderAgent;
use crate::agents::registrar::RegistrarAgent;
use crate::core::plan::ordered_steps;
use crate::core::registry::merge_definitions;
use crate::core::types::{Definitions, ExecutionRecord, MergeSummary, Step};
use crate::io::config::CoderConfig;
use crate::io::dependencies::read_dependencies;
use crate::io::layout::WorkspacePaths;
use crate::io::llm::LanguageModel;
use crate::io::persist::Persister;
use crate::io::prompt::{DescribePrompt, GenerationPrompt};
use crate::io::store::{
    load_or_init_definitions, load_plan, to_pretty_json, write_definitions, write_execution_log,
};

/// Result of an execution run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub records: Vec<ExecutionRecord>,
    pub definitions: Definitions,
}

struct StepRunner<'a, M, P> {
    paths: &'a WorkspacePaths,
    model: &'a M,
    persister: &'a P,
    coder: CoderAgent,
    registrar: RegistrarAgent,
    goal: &'a str,
}

/// Execute every plan step in ascending order.
///
/// The registry is rewritten after each step. The execution log is written
/// at the end, or with the records completed so far when a step fails.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run_execution<M: LanguageModel, P: Persister>(
    paths: &WorkspacePaths,
    config: &CoderConfig,
    model: &M,
    persister: &P,
    goal: &str,
) -> Result<ExecutionOutcome> {
    let plan = load_plan(&paths.plan_path, &paths.reserved_names())?;
    paths.ensure_log_dirs()?;
    let mut definitions = load_or_init_definitions(&paths.definitions_path)?;

    let agent_config = AgentConfig::new(config, paths);
    let runner = StepRunner {
        paths,
        model,
        persister,
        coder: CoderAgent::new(agent_config.clone()),
        registrar: RegistrarAgent::new(agent_config),
        goal,
    };

    let mut records = Vec::with_capacity(plan.plan.len());
    let mut failure = None;
    for step in ordered_steps(&plan) {
        info!(step = step.step, save_path = %step.save_path, "executing step");
        match runner
            .execute_step(step, &mut definitions)
            .with_context(|| format!("step {} ({})", step.step, step.save_path))
        {
            Ok(record) => records.push(record),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    let logged = write_execution_log(&paths.execution_log_path, &records);
    if let Some(err) = failure {
        if let Err(log_err) = logged {
            warn!(err = %format!("{log_err:#}"), "failed to write partial execution log");
        }
        return Err(err);
    }
    logged?;
    info!(steps = records.len(), entries = definitions.len(), "execution complete");

    Ok(ExecutionOutcome {
        records,
        definitions,
    })
}

impl<M: LanguageModel, P: Persister> StepRunner<'_, M, P> {
    fn execute_step(&self, step: &Step, definitions: &mut Definitions) -> Result<ExecutionRecord> {
        if step.creates_directory() {
            let report = self.persister.create_dir(&step.save_path)?;
            return Ok(ExecutionRecord {
                step: step.step,
                save_path: step.save_path.clone(),
                extra_info: step.extra_info.clone(),
                generated_content: None,
                generation_response: None,
                persist_report: report.describe(),
                definitions_response: None,
                registry_update: unchanged(definitions),
            });
        }

        let generation = GenerationPrompt {
            goal: self.goal.to_string(),
            step: step.step,
            kind: step
                .kind()
                .map(|kind| kind.as_str())
                .unwrap_or("unspecified")
                .to_string(),
            modification: step.modification.clone(),
            save_path: step.save_path.clone(),
            dependencies: read_dependencies(&self.paths.root, &step.dependencies),
            extra_info: if step.extra_info.is_empty() {
                String::new()
            } else {
                to_pretty_json(&step.extra_info)?
            },
            registry: if definitions.is_empty() {
                String::new()
            } else {
                to_pretty_json(definitions)?
            },
        };
        let generated = self.coder.generate(self.model, &generation)?;
        let report = self
            .persister
            .write_file(&step.save_path, &generated.content)?;

        let described = self.registrar.describe(
            self.model,
            step.step,
            &DescribePrompt {
                save_path: report.path.clone(),
                content: generated.content.clone(),
            },
        )?;
        let summary = merge_definitions(definitions, described.value);
        write_definitions(&self.paths.definitions_path, definitions)?;
        info!(
            step = step.step,
            added = summary.added,
            updated = summary.updated,
            "registry updated"
        );

        Ok(ExecutionRecord {
            step: step.step,
            save_path: step.save_path.clone(),
            extra_info: step.extra_info.clone(),
            generated_content: Some(generated.content),
            generation_response: Some(generated.response),
            persist_report: report.describe(),
            definitions_response: Some(described.raw),
            registry_update: summary,
        })
    }
}

fn unchanged(definitions: &Definitions) -> MergeSummary {
    MergeSummary {
        total_classes: definitions.classes.len(),
        total_functions: definitions.functions.len(),
        total_files: definitions.files.len(),
        ..MergeSummary::default()
    }
}
