//! Natural-language explanations from a hosted model
//!
//! Each call is a single chat-completion request with one user message; no
//! conversation state is kept between calls. The client is blocking, which
//! keeps the CLI free of a runtime; the dashboard server runs calls through
//! `spawn_blocking`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CodeSightError, Result};

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-Coder-32B-Instruct";
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const SERVICE: &str = "inference";

/// Text generation used by the dashboard panels
pub trait ExplanationService: Send + Sync {
    /// Explain what a snippet does
    fn explain(&self, code: &str) -> Result<String>;

    /// Answer a free-form question about a snippet
    fn answer(&self, code: &str, question: &str) -> Result<String>;

    /// Suggest improvements for a whole file
    fn suggest_improvements(&self, source: &str) -> Result<String>;
}

/// Prompt texts sent to the model
pub mod prompts {
    pub fn explain(code: &str) -> String {
        format!("What does this do: {}", code)
    }

    pub fn answer(code: &str, question: &str) -> String {
        format!("This is the code: ({}) and i want to know: ({})", code, question)
    }

    pub fn improvements(code: &str) -> String {
        format!("What can i improve in this code and how: {}", code)
    }
}

/// Connection settings for the inference endpoint
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl InferenceConfig {
    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct InferenceClient {
    config: InferenceConfig,
    http_client: reqwest::blocking::Client,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CodeSightError::service(SERVICE, format!("client setup failed: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Send one user message and return the model's reply
    pub fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CodeSightError::config("HUGGINGFACE_API_KEY is not set; explanations are unavailable")
            })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
        };

        tracing::info!(model = %self.config.model, prompt_bytes = prompt.len(), "requesting completion");

        let response = self
            .http_client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CodeSightError::service(
                        SERVICE,
                        format!("request timed out after {:?}", self.config.timeout),
                    )
                } else {
                    CodeSightError::service(SERVICE, format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CodeSightError::service(SERVICE, format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(%status, "inference endpoint returned an error");
            return Err(CodeSightError::service(
                SERVICE,
                format!("HTTP {}: {}", status, body_preview(&body)),
            ));
        }

        parse_reply(&body)
    }
}

impl ExplanationService for InferenceClient {
    fn explain(&self, code: &str) -> Result<String> {
        self.complete(&prompts::explain(code))
    }

    fn answer(&self, code: &str, question: &str) -> Result<String> {
        self.complete(&prompts::answer(code, question))
    }

    fn suggest_improvements(&self, source: &str) -> Result<String> {
        self.complete(&prompts::improvements(source))
    }
}

/// Pull the first choice's content out of a chat-completions response body
fn parse_reply(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CodeSightError::service(SERVICE, format!("malformed response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CodeSightError::service(SERVICE, "response contained no message content"))
}

fn body_preview(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        assert_eq!(prompts::explain("x = 1"), "What does this do: x = 1");
        assert_eq!(
            prompts::answer("x = 1", "why?"),
            "This is the code: (x = 1) and i want to know: (why?)"
        );
        assert_eq!(
            prompts::improvements("x = 1"),
            "What can i improve in this code and how: x = 1"
        );
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{"id":"1","choices":[{"index":0,"message":{"role":"assistant","content":"It adds."}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "It adds.");
    }

    #[test]
    fn test_parse_reply_rejects_empty_choices() {
        let err = parse_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, CodeSightError::Service { .. }));
        let err = parse_reply("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let client = InferenceClient::new(InferenceConfig::default()).unwrap();
        let err = client.explain("x = 1").unwrap_err();
        assert!(matches!(err, CodeSightError::Config { .. }));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = InferenceConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_preview_truncates() {
        let long = "x".repeat(300);
        assert_eq!(body_preview(&long).len(), 203);
    }
}
