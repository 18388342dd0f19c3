//! Language-model abstraction and the chat-completions transport.
//!
//! The [`LanguageModel`] trait decouples orchestration from the actual
//! backend (an OpenAI-compatible HTTP API). Tests use scripted models that
//! return predetermined replies without touching the network.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::io::config::LlmConfig;

/// One prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Stable label used for logging and transcript file names.
    pub label: String,
    /// Optional system message describing the agent's role.
    pub system: Option<String>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(label: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Text in, text out. Fallible; the caller blocks until the reply arrives.
pub trait LanguageModel {
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Errors surfaced by the HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Built once per run and passed by reference; the connection pool is
/// released when the client is dropped.
#[derive(Debug)]
pub struct ChatClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    config: LlmConfig,
}

impl ChatClient {
    /// Build a client from config. The API key is read from
    /// `config.api_key_env`; a missing key is not an error here, the
    /// endpoint rejects the request instead.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "api key not set; requests will be unauthenticated");
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            endpoint: chat_endpoint(&config.base_url),
            api_key,
            config: config.clone(),
        })
    }

    fn send(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = build_chat_request(&self.config, request);
        let mut builder = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send()?;
        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().unwrap_or_else(|_| "(no body)".into());
            return Err(LlmError::Api { status, message });
        }
        let text = response.text()?;
        parse_chat_response(&text)
    }
}

impl LanguageModel for ChatClient {
    #[instrument(skip_all, fields(label = %request.label, model = %self.config.model))]
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        info!(prompt_bytes = request.prompt.len(), "sending completion request");
        let reply = self
            .send(request)
            .with_context(|| format!("complete '{}'", request.label))?;
        debug!(reply_bytes = reply.len(), "completion received");
        Ok(reply)
    }
}

fn chat_endpoint(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    }
}

fn build_chat_request<'a>(config: &'a LlmConfig, request: &'a CompletionRequest) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    ChatRequest {
        model: &config.model,
        messages,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
    }
}

fn parse_chat_response(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| LlmError::InvalidResponse(format!("failed to parse response: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))
}

/// Invoke the model and write a transcript of the exchange under `transcripts_dir`.
#[instrument(skip_all, fields(label = %request.label))]
pub fn complete_logged<M: LanguageModel>(
    model: &M,
    request: &CompletionRequest,
    transcripts_dir: &Path,
) -> Result<String> {
    let reply = model.complete(request)?;
    write_transcript(transcripts_dir, request, &reply)?;
    Ok(reply)
}

fn write_transcript(dir: &Path, request: &CompletionRequest, reply: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create transcript dir {}", dir.display()))?;
    let path = dir.join(format!("{}.md", request.label));
    let mut buf = String::new();
    if let Some(system) = &request.system {
        buf.push_str("=== system ===\n");
        buf.push_str(system);
        buf.push('\n');
    }
    buf.push_str("=== prompt ===\n");
    buf.push_str(&request.prompt);
    buf.push_str("\n=== response ===\n");
    buf.push_str(reply);
    buf.push('\n');
    fs::write(&path, buf).with_context(|| format!("write transcript {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModel;

    impl LanguageModel for EchoModel {
        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            Ok(format!("echo: {}", request.prompt))
        }
    }

    #[test]
    fn endpoint_appends_chat_path_once() {
        assert_eq!(
            chat_endpoint("https://api.deepseek.com/"),
            "https://api.deepseek.com/chat/completions"
        );
        assert_eq!(
            chat_endpoint("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_builds_correctly() {
        let config = LlmConfig::default();
        let request = CompletionRequest::new("plan", "Hello").with_system("You plan.");
        let json = serde_json::to_value(build_chat_request(&config, &request)).expect("json");

        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hello");
        let temp = json["temperature"].as_f64().expect("temperature");
        assert!((temp - 0.4).abs() < 0.001);
    }

    #[test]
    fn parse_response_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        assert_eq!(parse_chat_response(body).expect("parse"), "hi");

        let err = parse_chat_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no message content"));

        let err = parse_chat_response("not json").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn complete_logged_writes_transcript() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("transcripts");
        let request = CompletionRequest::new("step-001-generate", "make it");

        let reply = complete_logged(&EchoModel, &request, &dir).expect("complete");
        assert_eq!(reply, "echo: make it");

        let transcript = fs::read_to_string(dir.join("step-001-generate.md")).expect("read");
        assert!(transcript.contains("=== prompt ===\nmake it"));
        assert!(transcript.contains("=== response ===\necho: make it"));
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = LlmError::Api {
            status: 401,
            message: "invalid api key".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }
}
