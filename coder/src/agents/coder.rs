//! Coder agent: produces the full contents of one step's file.

use anyhow::Result;

use crate::core::extract::extract_content;
use crate::io::llm::{CompletionRequest, LanguageModel, complete_logged};
use crate::io::prompt::GenerationPrompt;

use super::{AgentConfig, step_label};

const CODER_SYSTEM: &str = "You are a careful software engineer. Return complete files only.";

/// Generated file contents plus the raw reply they came from.
#[derive(Debug, Clone)]
pub struct Generated {
    pub content: String,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct CoderAgent {
    config: AgentConfig,
}

impl CoderAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn generate<M: LanguageModel>(&self, model: &M, input: &GenerationPrompt) -> Result<Generated> {
        let prompt = self.config.prompts().generation(input)?.into_string();
        let request = CompletionRequest::new(step_label(input.step, "generate"), prompt)
            .with_system(CODER_SYSTEM);
        let response = complete_logged(model, &request, &self.config.transcripts_dir)?;
        Ok(Generated {
            content: extract_content(&response),
            response,
        })
    }
}
