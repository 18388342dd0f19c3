//! Agents wrapping each kind of model call: planning, generation and description.
//!
//! Every structured reply goes through [`request_structured`], which extracts
//! the JSON payload, validates it against its schema plus any semantic check,
//! and re-asks the model with a correction section when validation fails.

use std::path::PathBuf;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::extract::extract_json;
use crate::error::CoderError;
use crate::io::config::CoderConfig;
use crate::io::layout::WorkspacePaths;
use crate::io::llm::{CompletionRequest, LanguageModel, complete_logged};
use crate::io::prompt::PromptBuilder;
use crate::io::schema::{SchemaKind, violations};

pub mod coder;
pub mod planner;
pub mod registrar;

/// Settings shared by every agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub prompt_budget_bytes: usize,
    /// Extra attempts after the first structured reply fails validation.
    pub schema_retries: u32,
    pub transcripts_dir: PathBuf,
}

impl AgentConfig {
    pub fn new(config: &CoderConfig, paths: &WorkspacePaths) -> Self {
        Self {
            prompt_budget_bytes: config.prompt_budget_bytes,
            schema_retries: config.schema_retries,
            transcripts_dir: paths.transcripts_dir.clone(),
        }
    }

    pub(crate) fn prompts(&self) -> PromptBuilder {
        PromptBuilder::new(self.prompt_budget_bytes)
    }
}

/// A validated structured reply.
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    /// Raw text of the accepted reply.
    pub raw: String,
    pub attempts: u32,
}

/// Invoke the model until its reply parses, matches `kind` and passes `check`.
///
/// Gives up after `1 + schema_retries` attempts with [`CoderError::Schema`].
pub(crate) fn request_structured<M, T, F>(
    model: &M,
    config: &AgentConfig,
    request: CompletionRequest,
    kind: SchemaKind,
    check: F,
) -> Result<Structured<T>>
where
    M: LanguageModel,
    T: DeserializeOwned,
    F: Fn(&T) -> Vec<String>,
{
    let max_attempts = config.schema_retries.saturating_add(1);
    let mut current = request.clone();
    let mut last_errors = Vec::new();

    for attempt in 1..=max_attempts {
        let reply = complete_logged(model, &current, &config.transcripts_dir)?;
        match parse_reply(&reply, kind, &check) {
            Ok(value) => {
                if attempt > 1 {
                    info!(label = %request.label, attempt, "structured reply accepted after correction");
                }
                return Ok(Structured {
                    value,
                    raw: reply,
                    attempts: attempt,
                });
            }
            Err(errors) => {
                warn!(
                    label = %request.label,
                    attempt,
                    violations = errors.len(),
                    "structured reply rejected"
                );
                let prompt =
                    PromptBuilder::correction(&request.prompt, &reply, &errors)?.into_string();
                current = CompletionRequest {
                    label: format!("{}-retry-{attempt}", request.label),
                    system: request.system.clone(),
                    prompt,
                };
                last_errors = errors;
            }
        }
    }

    Err(CoderError::Schema {
        label: request.label,
        attempts: max_attempts,
        errors: last_errors,
    }
    .into())
}

fn parse_reply<T, F>(reply: &str, kind: SchemaKind, check: &F) -> Result<T, Vec<String>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Vec<String>,
{
    let Some(payload) = extract_json(reply) else {
        return Err(vec!["reply contains no JSON payload".to_string()]);
    };
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| vec![format!("reply is not valid JSON: {err}")])?;
    let errors = violations(kind, &value).map_err(|err| vec![format!("{err:#}")])?;
    if !errors.is_empty() {
        return Err(errors);
    }
    let parsed: T = serde_json::from_value(value)
        .map_err(|err| vec![format!("reply does not match the expected shape: {err}")])?;
    let errors = check(&parsed);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(parsed)
}

/// Zero-padded step label, e.g. `step-003-generate`.
pub(crate) fn step_label(step: u32, action: &str) -> String {
    format!("step-{step:03}-{action}")
}
