use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::triage::{CreatedDraft, ReplyDrafts, TriageOutcome, TriageResult, TriageState};

pub fn print<T: Serialize>(value: &T) -> AppResult<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for ErrorView {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// One row of a triage run, success or failure.
#[derive(Debug, Serialize)]
pub struct TriageView<'a> {
    pub id: &'a str,
    pub state: TriageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a TriageResult>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub labels: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_error: Option<ErrorView>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub drafts: &'a [CreatedDraft],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_error: Option<ErrorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

impl<'a> TriageView<'a> {
    pub fn succeeded(outcome: &'a TriageOutcome, drafts: &'a ReplyDrafts) -> Self {
        Self {
            id: &outcome.message_id,
            state: outcome.state,
            result: Some(&outcome.result),
            labels: &outcome.labels,
            label_error: outcome.label_error.as_ref().map(ErrorView::from),
            drafts: &drafts.created,
            draft_error: drafts.error.as_ref().map(ErrorView::from),
            error: None,
        }
    }

    pub fn failed(id: &'a str, err: &AppError) -> Self {
        Self {
            id,
            state: TriageState::Failed,
            result: None,
            labels: &[],
            label_error: None,
            drafts: &[],
            draft_error: None,
            error: Some(ErrorView::from(err)),
        }
    }
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}
