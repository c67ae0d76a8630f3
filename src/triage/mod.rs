pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use pipeline::{
    CreatedDraft, DEFAULT_MARKER_LABEL, ReplyDrafts, TriageOutcome, TriagePipeline, TriageState,
    create_reply_drafts, derive_labels,
};
pub use prompt::{TEMPLATE_VERSION, build_prompt};
pub use schema::{Priority, SuggestedAction, TriageResult, validate};
