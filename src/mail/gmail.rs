use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::api::GmailClient;
use crate::api::labels::is_system_label;
use crate::api::models::LabelView;
use crate::error::AppResult;

use super::mime::{DraftMessage, build_raw_message};
use super::{MailSource, Message, ensure_positive_limit};

const INBOX_LABEL: &str = "INBOX";

/// Live mailbox backed by the Gmail REST API. Every operation is a network call.
#[derive(Debug)]
pub struct GmailMailSource {
    client: GmailClient,
    access_token: SecretString,
}

impl GmailMailSource {
    pub fn new(client: GmailClient, access_token: SecretString) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn token(&self) -> &str {
        self.access_token.expose_secret()
    }

    async fn label_names(&self) -> AppResult<HashMap<String, String>> {
        let labels = self.client.list_labels(self.token()).await?;
        Ok(labels
            .into_iter()
            .map(|label| (label.id, label.name))
            .collect())
    }

    /// Resolves label names to ids, creating user labels that do not exist yet.
    async fn ensure_label_ids(&self, known: &[LabelView], names: &[String]) -> AppResult<Vec<String>> {
        let mut out = Vec::new();

        for raw in names {
            let needle = raw.trim();
            if needle.is_empty() {
                continue;
            }

            let label_id = match find_label(known, needle) {
                Some(id) => id,
                None if is_system_label(needle) => needle.to_string(),
                None => self.client.create_label(needle, self.token()).await?.id,
            };

            if !out.contains(&label_id) {
                out.push(label_id);
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl MailSource for GmailMailSource {
    fn name(&self) -> &'static str {
        "gmail"
    }

    async fn list_messages(&self, limit: usize) -> AppResult<Vec<Message>> {
        ensure_positive_limit(limit)?;

        let ids = self
            .client
            .list_ids(self.token(), limit, Some(INBOX_LABEL))
            .await?;
        let names = self.label_names().await?;

        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            messages.push(self.client.get_message(&id, self.token(), &names).await?);
        }

        debug!(count = messages.len(), "listed gmail inbox");
        Ok(messages)
    }

    async fn get_message(&self, id: &str) -> AppResult<Message> {
        let names = self.label_names().await?;
        self.client.get_message(id, self.token(), &names).await
    }

    async fn apply_labels(&self, id: &str, add: &[String], remove: &[String]) -> AppResult<()> {
        let known = self.client.list_labels(self.token()).await?;
        let add_ids = self.ensure_label_ids(&known, add).await?;
        let remove_ids = remove
            .iter()
            .filter_map(|name| {
                let name = name.trim();
                find_label(&known, name).or_else(|| is_system_label(name).then(|| name.to_string()))
            })
            .collect::<Vec<_>>();

        if add_ids.is_empty() && remove_ids.is_empty() {
            return Ok(());
        }

        let result = self
            .client
            .modify_labels(id, add_ids, remove_ids, self.token())
            .await?;
        info!(id, added = ?result.added, removed = ?result.removed, "gmail labels updated");
        Ok(())
    }

    async fn create_draft(&self, thread_id: &str, body: &str) -> AppResult<String> {
        let context = self.client.reply_context(thread_id, self.token()).await?;
        let draft = DraftMessage::reply(&context, body);
        let raw = build_raw_message(&draft);
        let result = self
            .client
            .create_draft(&raw, thread_id, self.token())
            .await?;
        info!(thread_id, draft_id = %result.id, "gmail draft created");
        Ok(result.id)
    }
}

fn find_label(known: &[LabelView], needle: &str) -> Option<String> {
    known
        .iter()
        .find(|label| label.id == needle || label.name.eq_ignore_ascii_case(needle))
        .map(|label| label.id.clone())
}
