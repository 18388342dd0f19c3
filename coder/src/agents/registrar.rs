//! Registrar agent: describes the definitions a persisted file introduces.

use anyhow::Result;

use crate::core::types::Definitions;
use crate::io::llm::{CompletionRequest, LanguageModel};
use crate::io::prompt::DescribePrompt;
use crate::io::schema::SchemaKind;

use super::{AgentConfig, Structured, request_structured, step_label};

const REGISTRAR_SYSTEM: &str =
    "You catalogue source code definitions. Answer only with the JSON requested.";

#[derive(Debug, Clone)]
pub struct RegistrarAgent {
    config: AgentConfig,
}

impl RegistrarAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn describe<M: LanguageModel>(
        &self,
        model: &M,
        step: u32,
        input: &DescribePrompt,
    ) -> Result<Structured<Definitions>> {
        let prompt = self.config.prompts().describe(input)?.into_string();
        let request =
            CompletionRequest::new(step_label(step, "describe"), prompt).with_system(REGISTRAR_SYSTEM);
        request_structured(model, &self.config, request, SchemaKind::Definitions, |_| Vec::new())
    }
}
