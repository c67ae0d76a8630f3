use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::{MailSource, Message, ensure_positive_limit, merge_labels};

/// File-backed mailbox. Records are read once; every mutation stays in memory.
#[derive(Debug)]
pub struct DemoMailSource {
    messages: Mutex<Vec<Message>>,
}

impl DemoMailSource {
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("unable to read inbox {}: {err}", path.display()))
        })?;
        let messages: Vec<Message> = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), count = messages.len(), "loaded demo inbox");
        Ok(Self::from_messages(messages))
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MailSource for DemoMailSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn list_messages(&self, limit: usize) -> AppResult<Vec<Message>> {
        ensure_positive_limit(limit)?;
        Ok(self.records().iter().take(limit).cloned().collect())
    }

    async fn get_message(&self, id: &str) -> AppResult<Message> {
        self.records()
            .iter()
            .find(|message| message.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn apply_labels(&self, id: &str, add: &[String], remove: &[String]) -> AppResult<()> {
        let mut records = self.records();
        let message = records
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        merge_labels(&mut message.labels, add, remove);
        debug!(id, labels = ?message.labels, "demo labels updated");
        Ok(())
    }

    async fn create_draft(&self, thread_id: &str, _body: &str) -> AppResult<String> {
        Ok(format!("draft_{thread_id}"))
    }
}
