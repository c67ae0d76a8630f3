//! Offline backend for demos and tests. Replies are deterministic.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppResult;

use super::{CompletionRequest, ModelBackend};

const BILLING_REPLY: &str = r#"```json
{"summary":"Invoice for September is attached and payment is due in five days.","priority":"medium","reasons":["Payment deadline in five days","Finance related"],"suggested_actions":[{"type":"label","label":"EA/Action/Follow-Up"},{"type":"reply_draft","title":"Acknowledge invoice","body":"Thanks, I have forwarded this to finance and will confirm payment."}]}
```"#;

const URGENT_REPLY: &str = r#"{"summary":"Time-sensitive request that needs a response today from the recipient.","priority":"high","reasons":["Explicit deadline","Direct request"],"suggested_actions":[{"type":"label","label":"EA/Action/Follow-Up"}]}"#;

const LOW_REPLY: &str = r#"{"summary":"Informational message with no deadline or requested action.","priority":"low","reasons":["No action requested"],"suggested_actions":[]}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
}

#[derive(Debug)]
enum Reply {
    Fixed(String),
    Canned,
}

#[derive(Debug)]
pub struct MockBackend {
    reply: Reply,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockBackend {
    /// Always answers with `reply`, verbatim.
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fixed(reply.into()))
    }

    /// Picks a canned triage reply from keywords in the message part of the prompt.
    pub fn canned() -> Self {
        Self::with_reply(Reply::Canned)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> AppResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                model: request.model.to_string(),
                prompt: request.prompt.to_string(),
                temperature: request.temperature,
            });
        }

        Ok(match &self.reply {
            Reply::Fixed(reply) => reply.clone(),
            Reply::Canned => canned_reply(request.prompt).to_string(),
        })
    }
}

fn canned_reply(prompt: &str) -> &'static str {
    let message = prompt
        .split_once("\nTASK")
        .map_or(prompt, |(head, _)| head)
        .to_lowercase();

    if ["invoice", "billing", "payment"]
        .iter()
        .any(|word| message.contains(word))
    {
        return BILLING_REPLY;
    }

    if ["urgent", "asap", "interview", "deadline"]
        .iter()
        .any(|word| message.contains(word))
    {
        return URGENT_REPLY;
    }

    LOW_REPLY
}
