use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::{CompletionRequest, ModelBackend, endpoint_url, map_backend_error};

const ANTHROPIC_API_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_ENDPOINT: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicBackend {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl AnthropicBackend {
    pub fn new(api_key: SecretString, base_url: Option<&str>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url
                .unwrap_or(ANTHROPIC_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> AppResult<String> {
        let url = endpoint_url(&self.base_url, MESSAGES_ENDPOINT)?;
        let body = build_request(request);

        debug!(model = request.model, "sending anthropic message");
        let response = self
            .http
            .post(url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(map_backend_error(self.name(), status, &error_message(&raw)));
        }

        reply_text(&raw)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<MessageParam<'a>>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorEnvelope {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

fn build_request<'a>(request: &CompletionRequest<'a>) -> MessagesRequest<'a> {
    MessagesRequest {
        model: request.model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages: vec![MessageParam {
            role: "user",
            content: request.prompt,
        }],
    }
}

/// Concatenates the text blocks of a reply; other block kinds are skipped.
fn reply_text(raw: &str) -> AppResult<String> {
    let response: MessagesResponse = serde_json::from_str(raw).map_err(|err| {
        AppError::MalformedResponse(format!("unexpected anthropic response envelope: {err}"))
    })?;

    let text = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<String>();

    if text.trim().is_empty() {
        return Err(AppError::MalformedResponse(
            "anthropic returned no text content".to_string(),
        ));
    }

    Ok(text)
}

fn error_message(body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<AnthropicErrorEnvelope>(body) else {
        return body.trim().to_string();
    };

    match (envelope.error.message, envelope.error.kind) {
        (Some(message), Some(kind)) => format!("{message}, type={kind}"),
        (Some(message), None) => message,
        (None, Some(kind)) => format!("type={kind}"),
        (None, None) => body.trim().to_string(),
    }
}
