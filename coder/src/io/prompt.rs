//! Prompt builder: typed prompt inputs rendered through minijinja templates.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::io::dependencies::DependencyContent;
use crate::io::schema::SchemaKind;

const RELEVANT_PATHS_TEMPLATE: &str = include_str!("prompts/relevant_paths.md");
const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const GENERATE_TEMPLATE: &str = include_str!("prompts/generate.md");
const DESCRIBE_TEMPLATE: &str = include_str!("prompts/describe.md");
const CORRECTION_TEMPLATE: &str = include_str!("prompts/correction.md");

const PLAN_DROP_ORDER: &[&str] = &["structure"];
const GENERATION_DROP_ORDER: &[&str] = &["registry", "extra"];
const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Inputs for the relevant-path selection call.
#[derive(Debug, Clone, Serialize)]
pub struct RelevantPathsPrompt {
    pub goal: String,
    pub file_structure: Vec<String>,
}

/// Inputs for the plan drafting call.
#[derive(Debug, Clone, Serialize)]
pub struct PlanPrompt {
    pub goal: String,
    pub file_structure: Vec<String>,
    pub relevant_paths: Vec<String>,
}

/// Inputs for one step's content generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPrompt {
    pub goal: String,
    pub step: u32,
    /// Step kind as written in the plan, or `unspecified`.
    pub kind: String,
    pub modification: String,
    pub save_path: String,
    /// Dependency contents in plan order, sentinels included.
    pub dependencies: Vec<DependencyContent>,
    /// Pretty JSON of the step's extra info; empty when there is none.
    pub extra_info: String,
    /// Pretty JSON of the current registry; empty when the registry is empty.
    pub registry: String,
}

/// Inputs for the definitions extraction call.
#[derive(Debug, Clone, Serialize)]
pub struct DescribePrompt {
    pub save_path: String,
    pub content: String,
}

struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("relevant_paths", RELEVANT_PATHS_TEMPLATE),
            ("plan", PLAN_TEMPLATE),
            ("generate", GENERATE_TEMPLATE),
            ("describe", DESCRIBE_TEMPLATE),
            ("correction", CORRECTION_TEMPLATE),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} template"))
    }
}

#[derive(Debug, Clone)]
struct ParsedSection {
    key: String,
    required: bool,
    content: String,
}

/// Split rendered output on `<!-- section:KEY required|droppable -->` markers.
fn parse_sections(rendered: &str) -> Vec<ParsedSection> {
    static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"<!--\s*section:(\w+)\s+(required|droppable)\s*-->").expect("section regex")
    });

    let markers: Vec<_> = SECTION_RE
        .captures_iter(rendered)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((
                caps.get(1)?.as_str().to_string(),
                caps.get(2)?.as_str() == "required",
                whole.start(),
                whole.end(),
            ))
        })
        .collect();

    let mut sections = Vec::new();
    for (i, (key, required, _, body_start)) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|(_, _, next_start, _)| *next_start)
            .unwrap_or(rendered.len());
        let content = rendered[*body_start..end].trim().to_string();
        if !content.is_empty() || *required {
            sections.push(ParsedSection {
                key: key.clone(),
                required: *required,
                content,
            });
        }
    }
    sections
}

fn total_len(sections: &[ParsedSection]) -> usize {
    sections.iter().map(|s| s.content.len()).sum()
}

/// Drop droppable sections in `drop_order`, then truncate the last section.
fn apply_budget(sections: &mut Vec<ParsedSection>, budget: usize, drop_order: &[&str]) {
    if total_len(sections) <= budget {
        return;
    }

    for key in drop_order {
        if total_len(sections) <= budget {
            break;
        }
        if let Some(idx) = sections.iter().position(|s| s.key == *key && !s.required) {
            debug!(
                section = key,
                bytes_dropped = sections[idx].content.len(),
                "dropped section for budget"
            );
            sections.remove(idx);
        }
    }

    let total = total_len(sections);
    let Some(last) = sections.last_mut() else {
        return;
    };
    if total <= budget {
        return;
    }
    let allowed = budget.saturating_sub(total - last.content.len());
    let before_len = last.content.len();
    if allowed > TRUNCATION_MARKER.len() {
        truncate_on_char_boundary(&mut last.content, allowed - TRUNCATION_MARKER.len());
        last.content.push_str(TRUNCATION_MARKER);
    } else {
        truncate_on_char_boundary(&mut last.content, allowed);
    }
    debug!(
        section = last.key,
        before_len,
        after_len = last.content.len(),
        "truncated section for budget"
    );
}

fn truncate_on_char_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

fn render_sections(sections: &[ParsedSection]) -> String {
    sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds prompt packs within a byte budget, dropping less critical sections first.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    pub fn relevant_paths(&self, input: &RelevantPathsPrompt) -> Result<PromptPack> {
        let rendered = PromptEngine::new()?.render(
            "relevant_paths",
            context! {
                goal => input.goal.trim(),
                file_structure => &input.file_structure,
            },
        )?;
        // The listing is the whole input here: truncate it, never drop it.
        Ok(self.pack(&rendered, &[]))
    }

    pub fn plan(&self, input: &PlanPrompt) -> Result<PromptPack> {
        let rendered = PromptEngine::new()?.render(
            "plan",
            context! {
                goal => input.goal.trim(),
                file_structure => &input.file_structure,
                relevant_paths => &input.relevant_paths,
                schema => SchemaKind::Plan.source().trim(),
            },
        )?;
        Ok(self.pack(&rendered, PLAN_DROP_ORDER))
    }

    pub fn generation(&self, input: &GenerationPrompt) -> Result<PromptPack> {
        let rendered = PromptEngine::new()?.render(
            "generate",
            context! {
                goal => input.goal.trim(),
                step => input.step,
                kind => &input.kind,
                modification => input.modification.trim(),
                save_path => &input.save_path,
                dependencies => &input.dependencies,
                extra_info => input.extra_info.trim(),
                registry => input.registry.trim(),
            },
        )?;
        Ok(self.pack(&rendered, GENERATION_DROP_ORDER))
    }

    pub fn describe(&self, input: &DescribePrompt) -> Result<PromptPack> {
        let rendered = PromptEngine::new()?.render(
            "describe",
            context! {
                save_path => &input.save_path,
                content => &input.content,
                schema => SchemaKind::Definitions.source().trim(),
            },
        )?;
        Ok(self.pack(&rendered, &[]))
    }

    /// Re-ask prompt: the original prompt followed by the reply's violations.
    ///
    /// Not budgeted; the original prompt already is.
    pub fn correction(original: &str, previous: &str, errors: &[String]) -> Result<PromptPack> {
        let rendered = PromptEngine::new()?.render(
            "correction",
            context! {
                errors => errors,
                previous => previous.trim(),
            },
        )?;
        let mut sections = parse_sections(&rendered);
        sections.insert(
            0,
            ParsedSection {
                key: "original".to_string(),
                required: true,
                content: original.trim().to_string(),
            },
        );
        Ok(PromptPack {
            content: render_sections(&sections),
        })
    }

    fn pack(&self, rendered: &str, drop_order: &[&str]) -> PromptPack {
        let mut sections = parse_sections(rendered);
        apply_budget(&mut sections, self.budget_bytes, drop_order);
        PromptPack {
            content: render_sections(&sections),
        }
    }
}

/// A rendered prompt ready to send to the model.
#[derive(Debug, Clone)]
pub struct PromptPack {
    content: String,
}

impl PromptPack {
    pub fn into_string(self) -> String {
        self.content
    }
}
