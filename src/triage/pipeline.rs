//! Prompt, model call, validation and label application for one message at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::llm::JsonModelClient;
use crate::mail::{MailSource, Message};

use super::prompt::build_prompt;
use super::schema::{Priority, TriageResult, validate};

pub const DEFAULT_MARKER_LABEL: &str = "EA/Summary";

/// Where a triaged message ended up. A message is pending only while its call is
/// in flight, so every reported outcome is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageState {
    /// Judged and validated, but the label change was rejected.
    Validated,
    Applied,
    Failed,
}

/// A validated judgment plus what happened when its labels were applied.
#[derive(Debug)]
pub struct TriageOutcome {
    pub message_id: String,
    pub thread_id: String,
    pub result: TriageResult,
    pub labels: Vec<String>,
    pub state: TriageState,
    /// Set when the mail source rejected the label change. The judgment stays usable.
    pub label_error: Option<AppError>,
}

impl TriageOutcome {
    pub fn labels_applied(&self) -> bool {
        self.state == TriageState::Applied
    }
}

/// One draft created from a `reply_draft` suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedDraft {
    pub title: String,
    pub draft_id: String,
}

#[derive(Debug)]
pub struct TriagePipeline<'a> {
    client: &'a JsonModelClient,
    marker_label: String,
    locks: LabelLocks,
}

impl<'a> TriagePipeline<'a> {
    pub fn new(client: &'a JsonModelClient) -> Self {
        Self::with_marker(client, DEFAULT_MARKER_LABEL)
    }

    pub fn with_marker(client: &'a JsonModelClient, marker_label: impl Into<String>) -> Self {
        Self {
            client,
            marker_label: marker_label.into(),
            locks: LabelLocks::default(),
        }
    }

    pub fn marker_label(&self) -> &str {
        &self.marker_label
    }

    /// Judges `message` and labels it through `source`.
    ///
    /// Model and validation failures return `Err` before the mailbox is touched.
    /// A failed label change still returns the judgment, with `label_error` set.
    pub async fn triage_message(
        &self,
        source: &dyn MailSource,
        message: &Message,
    ) -> AppResult<TriageOutcome> {
        let prompt = build_prompt(&message.subject, &message.sender, &message.body_text);
        let raw = self.client.ask_json(&prompt).await?;
        let result = validate(&raw)?;

        let labels = derive_labels(&result, &self.marker_label);
        let label_error = {
            let lock = self.locks.for_id(&message.id);
            let _guard = lock.lock().await;
            source.apply_labels(&message.id, &labels, &[]).await.err()
        };
        let state = if label_error.is_some() {
            TriageState::Validated
        } else {
            TriageState::Applied
        };

        Ok(TriageOutcome {
            message_id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            result,
            labels,
            state,
            label_error,
        })
    }

    /// Fetches `id` from `source` and triages it. Unknown ids fail before any model call.
    pub async fn triage_id(&self, source: &dyn MailSource, id: &str) -> AppResult<TriageOutcome> {
        let message = source.get_message(id).await?;
        self.triage_message(source, &message).await
    }

    /// Triages `messages` with up to `concurrency` calls in flight.
    ///
    /// Results come back in input order. Label changes for the same message id
    /// never overlap, even when the id appears twice in the batch.
    pub async fn triage_batch(
        &self,
        source: &dyn MailSource,
        messages: &[Message],
        concurrency: usize,
    ) -> Vec<(String, AppResult<TriageOutcome>)> {
        stream::iter(messages)
            .map(|message| async move {
                (message.id.clone(), self.triage_message(source, message).await)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Drafts created for one outcome, and the error that stopped the rest if any.
#[derive(Debug, Default)]
pub struct ReplyDrafts {
    pub created: Vec<CreatedDraft>,
    pub error: Option<AppError>,
}

impl ReplyDrafts {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Creates one draft per `reply_draft` suggestion in `outcome`. Callers opt in explicitly.
///
/// Stops at the first rejected draft. Drafts already created are kept in the
/// report, and the judgment itself is unaffected.
pub async fn create_reply_drafts(
    source: &dyn MailSource,
    outcome: &TriageOutcome,
) -> ReplyDrafts {
    let mut drafts = ReplyDrafts::default();
    for (title, body) in outcome.result.reply_drafts() {
        match source.create_draft(&outcome.thread_id, body).await {
            Ok(draft_id) => drafts.created.push(CreatedDraft {
                title: title.to_string(),
                draft_id,
            }),
            Err(err) => {
                drafts.error = Some(err);
                break;
            }
        }
    }
    drafts
}

/// Marker first, then the priority label, then label suggestions in order.
///
/// Suggestions naming a different priority label are dropped so the set always
/// carries exactly one priority label.
pub fn derive_labels(result: &TriageResult, marker_label: &str) -> Vec<String> {
    let priority_label = result.priority.label();
    let mut labels = vec![marker_label.to_string()];
    if priority_label != marker_label {
        labels.push(priority_label.to_string());
    }

    for suggested in result.label_actions() {
        let is_other_priority = Priority::ALL
            .iter()
            .any(|priority| priority.label() == suggested && *priority != result.priority);
        if is_other_priority || labels.iter().any(|label| label == suggested) {
            continue;
        }
        labels.push(suggested.to_string());
    }

    labels
}

/// Per message id mutex guarding label mutation.
#[derive(Debug, Default)]
struct LabelLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LabelLocks {
    fn for_id(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(id.to_string()).or_default())
    }
}
