//! Model profiles, the text-completion seam and its Anthropic Messages
//! API implementation, plus helpers for pulling JSON out of model replies.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Error, Debug)]
pub enum AiError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Anthropic API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model response contained no text")]
    EmptyResponse,

    #[error("Unknown model profile '{0}' (expected haiku, sonnet or opus)")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, AiError>;

/// Abstract model tiers; the concrete ids live in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelProfile {
    /// Cheap and fast; used for link filtering.
    Haiku,
    /// Balanced; used for test-case generation.
    Sonnet,
    Opus,
}

impl ModelProfile {
    pub const ALL: [ModelProfile; 3] = [ModelProfile::Haiku, ModelProfile::Sonnet, ModelProfile::Opus];

    pub fn model_id(&self) -> &'static str {
        match self {
            ModelProfile::Haiku => "claude-3-haiku-20240307",
            ModelProfile::Sonnet => "claude-sonnet-4-5-20250929",
            ModelProfile::Opus => "claude-opus-4-5-20251101",
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            ModelProfile::Haiku => "Claude 3 Haiku",
            ModelProfile::Sonnet => "Claude Sonnet 4.5",
            ModelProfile::Opus => "Claude Opus 4.5",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProfile::Haiku => "haiku",
            ModelProfile::Sonnet => "sonnet",
            ModelProfile::Opus => "opus",
        }
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProfile {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "haiku" => Ok(ModelProfile::Haiku),
            "sonnet" => Ok(ModelProfile::Sonnet),
            "opus" => Ok(ModelProfile::Opus),
            other => Err(AiError::UnknownProfile(other.to_string())),
        }
    }
}

/// Options for a single completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest {
    pub profile: ModelProfile,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(profile: ModelProfile, max_tokens: u32) -> Self {
        Self {
            profile,
            max_tokens,
        }
    }
}

/// Free-form text in, free-form text out.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, request: CompletionRequest) -> Result<String>;
}

/// Async client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from `ANTHROPIC_API_KEY` and optional
    /// `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::MissingApiKey)?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(api_key, base_url)
    }
}

#[async_trait]
impl Completion for AnthropicClient {
    async fn complete(&self, prompt: &str, request: CompletionRequest) -> Result<String> {
        let body = json!({
            "model": request.profile.model_id(),
            "max_tokens": request.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(
            "Requesting completion from {} ({} prompt bytes)",
            request.profile.model_id(),
            prompt.len()
        );

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: Value = serde_json::from_str(&text).map_err(|_| AiError::EmptyResponse)?;
        let reply = parsed["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(reply)
    }
}

/// Every JSON array that starts at some `[` in `text`, in order. The text
/// may wrap the arrays in prose or code fences.
pub fn json_arrays(text: &str) -> impl Iterator<Item = Value> + '_ {
    text.match_indices('[').filter_map(move |(start, _)| {
        // Parse the value that starts here and ignore whatever trails it
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value @ Value::Array(_))) => Some(value),
            _ => None,
        }
    })
}

/// Locate the first JSON array in `text`. Returns `None` when nothing
/// parses as an array.
pub fn extract_json_array(text: &str) -> Option<Value> {
    json_arrays(text).next()
}

/// Strip a surrounding markdown code fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.strip_suffix("```").unwrap_or(body).trim()
}
