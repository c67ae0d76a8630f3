use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LabelView {
    pub id: String,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelMutationResult {
    pub id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Addressing details of the newest message in a thread.
#[derive(Debug, Clone, Default)]
pub struct ReplyContext {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub reply_to: Option<String>,
    pub message_id: Option<String>,
    pub references: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftResult {
    pub id: String,
    pub message_id: Option<String>,
    pub thread_id: Option<String>,
}
