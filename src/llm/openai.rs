use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::{CompletionRequest, ModelBackend, endpoint_url, map_backend_error};

const OPENAI_API_BASE_URL: &str = "https://api.openai.com";
const CHAT_COMPLETIONS_ENDPOINT: &str = "/v1/chat/completions";

#[derive(Debug)]
pub struct OpenAiBackend {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString, base_url: Option<&str>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url
                .unwrap_or(OPENAI_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> AppResult<String> {
        let url = endpoint_url(&self.base_url, CHAT_COMPLETIONS_ENDPOINT)?;
        let body = build_request(request);

        debug!(model = request.model, "sending openai chat completion");
        let response = self
            .http
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
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
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

fn build_request<'a>(request: &CompletionRequest<'a>) -> ChatRequest<'a> {
    ChatRequest {
        model: request.model,
        messages: vec![ChatMessage {
            role: "user",
            content: request.prompt,
        }],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn reply_text(raw: &str) -> AppResult<String> {
    let response: ChatResponse = serde_json::from_str(raw).map_err(|err| {
        AppError::MalformedResponse(format!("unexpected openai response envelope: {err}"))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::MalformedResponse("openai returned no message content".to_string()))
}

fn error_message(body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<OpenAiErrorEnvelope>(body) else {
        return body.trim().to_string();
    };

    let mut parts = Vec::new();
    if let Some(message) = envelope.error.message {
        parts.push(message);
    }
    if let Some(kind) = envelope.error.kind {
        parts.push(format!("type={kind}"));
    }
    if let Some(code) = envelope.error.code {
        parts.push(format!("code={code}"));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_single_user_turn() {
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            prompt: "triage this",
            temperature: 0.0,
            max_tokens: 1024,
        };

        let body = serde_json::to_value(build_request(&request)).expect("serializes");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "triage this");
    }

    #[test]
    fn extracts_first_choice_content() {
        let raw = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"},"finish_reason":"stop"}]}"#;
        assert_eq!(reply_text(raw).expect("content"), "{\"a\":1}");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = reply_text(r#"{"choices":[]}"#).expect_err("no content");
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn formats_error_envelope() {
        let message = error_message(
            r#"{"error":{"message":"The model `gpt-5x` does not exist","type":"invalid_request_error","code":"model_not_found"}}"#,
        );
        assert_eq!(
            message,
            "The model `gpt-5x` does not exist, type=invalid_request_error, code=model_not_found"
        );
    }
}
