//! Planner agent: relevant-path selection and plan drafting.

use anyhow::Result;

use crate::core::path::normalize_relative;
use crate::core::plan::validate_plan;
use crate::core::types::PlanDocument;
use crate::io::llm::{CompletionRequest, LanguageModel};
use crate::io::prompt::{PlanPrompt, RelevantPathsPrompt};
use crate::io::schema::SchemaKind;

use super::{AgentConfig, Structured, request_structured};

const PLANNER_SYSTEM: &str =
    "You are a senior software engineer planning changes to a code workspace. \
     Answer only with the JSON requested.";

pub const RELEVANT_PATHS_LABEL: &str = "relevant-paths";
pub const PLAN_LABEL: &str = "plan";

#[derive(Debug, Clone)]
pub struct PlannerAgent {
    config: AgentConfig,
    /// Top-level names a drafted step may not write to.
    reserved: Vec<String>,
}

impl PlannerAgent {
    pub fn new(config: AgentConfig, reserved: Vec<String>) -> Self {
        Self { config, reserved }
    }

    /// Ask which listed paths matter for `goal`.
    pub fn select_relevant_paths<M: LanguageModel>(
        &self,
        model: &M,
        input: &RelevantPathsPrompt,
    ) -> Result<Structured<Vec<String>>> {
        let prompt = self.config.prompts().relevant_paths(input)?.into_string();
        let request = CompletionRequest::new(RELEVANT_PATHS_LABEL, prompt).with_system(PLANNER_SYSTEM);
        request_structured(
            model,
            &self.config,
            request,
            SchemaKind::RelevantPaths,
            |paths: &Vec<String>| {
                paths
                    .iter()
                    .filter_map(|path| {
                        normalize_relative(path)
                            .err()
                            .map(|reason| format!("relevant path rejected: {reason}"))
                    })
                    .collect()
            },
        )
    }

    /// Draft the ordered step list.
    pub fn draft_plan<M: LanguageModel>(
        &self,
        model: &M,
        input: &PlanPrompt,
    ) -> Result<Structured<PlanDocument>> {
        let prompt = self.config.prompts().plan(input)?.into_string();
        let request = CompletionRequest::new(PLAN_LABEL, prompt).with_system(PLANNER_SYSTEM);
        request_structured(
            model,
            &self.config,
            request,
            SchemaKind::Plan,
            |plan: &PlanDocument| validate_plan(plan, &self.reserved),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    struct CapturingModel {
        reply: String,
        last_request: RefCell<Option<CompletionRequest>>,
    }

    impl CapturingModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_request: RefCell::new(None),
            }
        }
    }

    impl LanguageModel for CapturingModel {
        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            *self.last_request.borrow_mut() = Some(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn agent(dir: &Path) -> PlannerAgent {
        PlannerAgent::new(
            AgentConfig {
                prompt_budget_bytes: 50_000,
                schema_retries: 0,
                transcripts_dir: dir.to_path_buf(),
            },
            vec!["ca_logs".to_string()],
        )
    }

    #[test]
    fn relevant_paths_prompt_carries_goal_and_listing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = CapturingModel::new("```json\n[\"sub/c.py\"]\n```");
        let input = RelevantPathsPrompt {
            goal: "refactor c".to_string(),
            file_structure: vec!["a.py".to_string(), "sub".to_string(), "sub/c.py".to_string()],
        };

        let result = agent(temp.path())
            .select_relevant_paths(&model, &input)
            .expect("select");

        assert_eq!(result.value, vec!["sub/c.py"]);
        let request = model.last_request.borrow().clone().expect("request");
        assert_eq!(request.label, RELEVANT_PATHS_LABEL);
        assert!(request.system.is_some());
        assert!(request.prompt.contains("refactor c"));
        assert!(request.prompt.contains("sub/c.py"));
    }

    #[test]
    fn draft_plan_parses_and_validates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let reply = r#"Here is the plan:
```json
{"plan": [
  {"step": 2, "dependencies": ["calc.py"], "modification": "cli", "save_path": "cli.py",
   "extra_info": {"type": "create", "structure": {"functions": ["main"]}}},
  {"step": 1, "modification": "calculator", "save_path": "calc.py"}
]}
```"#;
        let model = CapturingModel::new(reply);
        let input = PlanPrompt {
            goal: "calculator".to_string(),
            file_structure: Vec::new(),
            relevant_paths: Vec::new(),
        };

        let plan = agent(temp.path()).draft_plan(&model, &input).expect("plan");

        assert_eq!(plan.value.plan.len(), 2);
        assert_eq!(plan.value.plan[0].dependencies, vec!["calc.py"]);
        assert!(plan.raw.starts_with("Here is the plan"));
    }

    #[test]
    fn draft_plan_rejects_escaping_save_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = CapturingModel::new(
            r#"{"plan": [{"step": 1, "modification": "x", "save_path": "../x.py"}]}"#,
        );
        let input = PlanPrompt {
            goal: "g".to_string(),
            file_structure: Vec::new(),
            relevant_paths: Vec::new(),
        };

        let err = agent(temp.path()).draft_plan(&model, &input).unwrap_err();
        assert!(err.to_string().contains("escapes the workspace"));
    }

    #[test]
    fn draft_plan_rejects_writes_into_log_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = CapturingModel::new(
            r#"{"plan": [{"step": 1, "modification": "x", "save_path": "ca_logs/plan.json"}]}"#,
        );
        let input = PlanPrompt {
            goal: "g".to_string(),
            file_structure: Vec::new(),
            relevant_paths: Vec::new(),
        };

        let err = agent(temp.path()).draft_plan(&model, &input).unwrap_err();
        assert!(err.to_string().contains("reserved 'ca_logs'"));
    }
}
