//! Text-generation backends and the JSON-extracting client in front of them.
//!
//! Backends differ only in request shape and in how reply text is pulled out
//! of the response envelope. JSON recovery lives in [`extract`] and is shared.

pub mod anthropic;
pub mod credential;
pub mod extract;
pub mod mock;
pub mod models;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::SecretStore;
use crate::error::{AppError, AppResult};

pub use anthropic::AnthropicBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;

const TRIAGE_TEMPERATURE: f32 = 0.0;
const TRIAGE_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    #[value(name = "anthropic")]
    Anthropic,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// A single user-turn completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sends the request and returns the raw reply text.
    async fn complete(&self, request: &CompletionRequest<'_>) -> AppResult<String>;
}

#[async_trait]
impl<T: ModelBackend + ?Sized> ModelBackend for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> AppResult<String> {
        (**self).complete(request).await
    }
}

/// Builds a network backend, resolving its api key before any request is made.
pub fn connect(
    kind: BackendKind,
    explicit_key: Option<&str>,
    secrets: &dyn SecretStore,
    base_url: Option<&str>,
) -> AppResult<Box<dyn ModelBackend>> {
    let api_key = credential::resolve_api_key(kind, explicit_key, secrets)?;

    Ok(match kind {
        BackendKind::OpenAi => Box::new(OpenAiBackend::new(api_key, base_url)),
        BackendKind::Anthropic => Box::new(AnthropicBackend::new(api_key, base_url)),
    })
}

/// Sends prompts to one backend and returns the JSON value found in each reply.
pub struct JsonModelClient {
    backend: Box<dyn ModelBackend>,
    model: String,
    timeout: Duration,
}

impl JsonModelClient {
    pub fn new(backend: Box<dyn ModelBackend>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ask_json(&self, prompt: &str) -> AppResult<Value> {
        self.ask_json_with_model(prompt, &self.model).await
    }

    /// Malformed replies and timeouts are returned as errors, never retried here.
    pub async fn ask_json_with_model(&self, prompt: &str, model: &str) -> AppResult<Value> {
        let request = CompletionRequest {
            model,
            prompt,
            temperature: TRIAGE_TEMPERATURE,
            max_tokens: TRIAGE_MAX_TOKENS,
        };

        let text = tokio::time::timeout(self.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{} model call exceeded {}s",
                    self.backend.name(),
                    self.timeout.as_secs()
                ))
            })??;

        extract::parse_json_reply(&text)
    }
}

impl std::fmt::Debug for JsonModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonModelClient")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Appends `endpoint` to the path of `base_url`, so proxy prefixes survive.
pub(crate) fn endpoint_url(base_url: &str, endpoint: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)?;
    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    url.set_path(&path);
    Ok(url)
}

pub(crate) fn map_backend_error(backend: &str, status: StatusCode, message: &str) -> AppError {
    let message = if message.trim().is_empty() {
        "no error details in response body"
    } else {
        message.trim()
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(format!(
            "{backend} rejected the api key ({status}): {message}"
        )),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AppError::Timeout(format!("{backend} request timed out ({status}): {message}"))
        }
        _ => AppError::Api(format!("{backend} request failed ({status}): {message}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct SlowBackend;

    #[async_trait]
    impl ModelBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> AppResult<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let client = JsonModelClient::new(Box::new(SlowBackend), "m", Duration::from_millis(20));
        let err = client.ask_json("prompt").await.expect_err("should time out");
        assert!(matches!(err, AppError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn sends_zero_temperature_and_model() {
        let backend = Arc::new(MockBackend::fixed(r#"{"ok":true}"#));
        let client = JsonModelClient::new(
            Box::new(Arc::clone(&backend)),
            "gpt-4o-mini",
            Duration::from_secs(1),
        );

        let value = client.ask_json("hello").await.expect("json reply");
        assert_eq!(value["ok"], true);

        let seen = backend.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].prompt, "hello");
        assert_eq!(seen[0].temperature, 0.0);
    }

    #[test]
    fn maps_unauthorized_backend_error() {
        let err = map_backend_error("openai", StatusCode::UNAUTHORIZED, "Incorrect API key");
        assert!(matches!(err, AppError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn parses_backend_kind_names() {
        let kind: BackendKind = serde_json::from_str("\"anthropic\"").expect("kind parses");
        assert_eq!(kind, BackendKind::Anthropic);
        assert_eq!(BackendKind::OpenAi.env_var(), "OPENAI_API_KEY");
    }

    #[test]
    fn endpoint_joins_onto_base_path() {
        let plain = endpoint_url("https://api.openai.com", "/v1/chat/completions").expect("url");
        assert_eq!(plain.as_str(), "https://api.openai.com/v1/chat/completions");

        let proxied = endpoint_url("https://gateway.example.com/openai/", "/v1/chat/completions")
            .expect("url");
        assert_eq!(
            proxied.as_str(),
            "https://gateway.example.com/openai/v1/chat/completions"
        );
    }
}
