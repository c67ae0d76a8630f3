//! Mailbox abstraction shared by the triage pipeline and the CLI.
//!
//! A [`MailSource`] is any mailbox that can list, fetch, relabel, and draft
//! replies. Two variants exist: [`DemoMailSource`] over a local JSON inbox
//! and [`GmailMailSource`] over the Gmail REST API.

pub mod demo;
pub mod gmail;
pub mod mime;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub use demo::DemoMailSource;
pub use gmail::GmailMailSource;

/// One email under triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    /// Seconds since the unix epoch.
    #[serde(alias = "when")]
    pub timestamp: i64,
    pub sender: String,
    pub subject: String,
    pub body_text: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl Message {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

#[async_trait]
pub trait MailSource: Send + Sync {
    /// Short name used in logs and output.
    fn name(&self) -> &'static str;

    /// Up to `limit` messages in source order. `limit` must be positive.
    async fn list_messages(&self, limit: usize) -> AppResult<Vec<Message>>;

    async fn get_message(&self, id: &str) -> AppResult<Message>;

    /// Union `add` into the label set, then remove `remove`. Repeating the
    /// same call leaves the label set unchanged.
    async fn apply_labels(&self, id: &str, add: &[String], remove: &[String]) -> AppResult<()>;

    /// Creates a reply draft in `thread_id` and returns its identifier.
    async fn create_draft(&self, thread_id: &str, body: &str) -> AppResult<String>;
}

pub(crate) fn ensure_positive_limit(limit: usize) -> AppResult<()> {
    if limit == 0 {
        return Err(AppError::InvalidInput(
            "limit must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Applies an add/remove pair to a label set with set semantics.
pub(crate) fn merge_labels(labels: &mut BTreeSet<String>, add: &[String], remove: &[String]) {
    for label in add {
        let label = label.trim();
        if !label.is_empty() {
            labels.insert(label.to_string());
        }
    }

    for label in remove {
        labels.remove(label.trim());
    }
}
