//! OpenAI-compatible Chat Completions backend (non-streaming).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::providers::shared::USER_AGENT;
use crate::providers::{
    ChatBackend, ChatMessage, ProviderError, ProviderErrorKind, ProviderResult, resolve_api_key,
    resolve_base_url,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub request_timeout: Option<Duration>,
}

impl OpenAIChatConfig {
    /// Resolves credentials and endpoint for the configured provider.
    ///
    /// Authentication: `api_key` from config, then `OPENAI_API_KEY`.
    /// Base URL: `OPENAI_BASE_URL`, then config, then the public endpoint.
    ///
    /// # Errors
    /// Returns an error if no key is available or the base URL is invalid.
    pub fn from_provider(provider: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(provider.api_key.as_deref(), API_KEY_ENV, "provider")?;
        let base_url = resolve_base_url(
            provider.base_url.as_deref(),
            BASE_URL_ENV,
            DEFAULT_BASE_URL,
            "OpenAI",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model: provider.model.clone(),
            max_tokens: provider.max_tokens,
            temperature: provider.temperature,
            top_p: provider.top_p,
            frequency_penalty: provider.frequency_penalty,
            request_timeout: provider.request_timeout(),
        })
    }
}

/// Chat completions client.
pub struct OpenAIChatClient {
    config: OpenAIChatConfig,
    http: reqwest::Client,
}

impl OpenAIChatClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenAIChatConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
        };
        let url = format!("{}{}", self.config.base_url, CHAT_COMPLETIONS_PATH);

        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(ProviderError::http_status(status.as_u16(), &body));
        }

        parse_reply(&body)
    }
}

impl ChatBackend for OpenAIChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        self.send(messages).await
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers
}

fn classify_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_decode() || e.is_body() {
        ProviderError::parse(format!("Failed to read response: {e}"))
    } else {
        ProviderError::new(
            ProviderErrorKind::HttpStatus,
            format!("Network error: {e}"),
        )
    }
}

/// Extracts the first choice's text from a response body.
fn parse_reply(body: &str) -> ProviderResult<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::parse(format!("Invalid chat completion JSON: {e}")))?;

    if let Some(error) = response.error {
        return Err(ProviderError::api_error(error.message));
    }

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::api_error("Response contained no message content"))?;

    Ok(content.trim().to_string())
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
