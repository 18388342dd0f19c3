//! Coder configuration, read from `<workspace>/.caconfig.toml` or `--config`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".caconfig.toml";

/// Coder configuration (TOML).
///
/// Missing fields fall back to defaults so a partial file is enough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoderConfig {
    /// Directory under the workspace holding plan, registry and logs.
    pub log_dir: String,

    /// Ignore control file name at the workspace root.
    pub ignore_file: String,

    /// Extra attempts granted to a structured reply that fails validation.
    pub schema_retries: u32,

    /// Maximum bytes for a rendered prompt before sections are dropped.
    pub prompt_budget_bytes: usize,

    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Transport timeout for a single request.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 2048,
            temperature: 0.4,
            top_p: 0.9,
            timeout_secs: 600,
        }
    }
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            log_dir: "ca_logs".to_string(),
            ignore_file: ".caignore".to_string(),
            schema_retries: 2,
            prompt_budget_bytes: 120_000,
            llm: LlmConfig::default(),
        }
    }
}

impl CoderConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_segment("log_dir", &self.log_dir)?;
        ensure_segment("ignore_file", &self.ignore_file)?;
        if self.prompt_budget_bytes == 0 {
            return Err(anyhow!("prompt_budget_bytes must be > 0"));
        }
        self.llm.validate()
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!("llm.base_url must be non-empty"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("llm.model must be non-empty"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("llm.max_tokens must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("llm.timeout_secs must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("llm.temperature must be within [0, 2]"));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(anyhow!("llm.top_p must be within (0, 1]"));
        }
        Ok(())
    }
}

fn ensure_segment(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{field} must be non-empty"));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(anyhow!("{field} must be a single path segment (got '{value}')"));
    }
    Ok(())
}

/// Resolve the config path: explicit `--config`, else the workspace default.
pub fn resolve_config_path(workspace: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => workspace.join(CONFIG_FILE_NAME),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CoderConfig::default()`.
pub fn load_config(path: &Path) -> Result<CoderConfig> {
    if !path.exists() {
        let cfg = CoderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CoderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
