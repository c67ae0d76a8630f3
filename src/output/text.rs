use chrono::DateTime;

use crate::error::AppError;
use crate::mail::Message;
use crate::triage::{ReplyDrafts, SuggestedAction, TriageOutcome};

const PREVIEW_CHARS: usize = 120;

pub fn print_line(line: &str) {
    println!("{line}");
}

pub fn message_summary(index: usize, message: &Message) -> String {
    let mut lines = vec![
        format!("{}. {}", index + 1, message.id),
        format!("   from: {}", or_placeholder(&message.sender, "(unknown sender)")),
        format!("   subject: {}", or_placeholder(&message.subject, "(no subject)")),
        format!("   date: {}", format_timestamp(message.timestamp)),
    ];
    if !message.labels.is_empty() {
        lines.push(format!("   labels: {}", join_labels(message)));
    }
    lines.push(String::new());
    lines.push(format!("   {}", format_preview(&message.body_text)));
    lines.join("\n")
}

pub fn message_detail(message: &Message) -> String {
    let mut lines = vec![
        format!("id: {}", message.id),
        format!("thread: {}", message.thread_id),
        format!("from: {}", or_placeholder(&message.sender, "(unknown sender)")),
        format!("subject: {}", or_placeholder(&message.subject, "(no subject)")),
        format!("date: {}", format_timestamp(message.timestamp)),
    ];
    if !message.labels.is_empty() {
        lines.push(format!("labels: {}", join_labels(message)));
    }
    lines.push(String::new());
    lines.push(message.body_text.trim_end().to_string());
    lines.join("\n")
}

pub fn triage_card(outcome: &TriageOutcome, drafts: &ReplyDrafts) -> String {
    let result = &outcome.result;
    let mut lines = vec![
        format!("{} [{}]", outcome.message_id, result.priority.as_str().to_uppercase()),
        format!("  summary: {}", result.summary),
    ];

    for reason in &result.reasons {
        lines.push(format!("  - {reason}"));
    }

    for action in &result.suggested_actions {
        lines.push(match action {
            SuggestedAction::Label { label } => format!("  suggested label: {label}"),
            SuggestedAction::ReplyDraft { title, .. } => format!("  suggested reply: {title}"),
        });
    }

    match &outcome.label_error {
        None => lines.push(format!("  labels applied: {}", outcome.labels.join(", "))),
        Some(err) => lines.push(format!("  labels not applied ({}): {err}", err.kind())),
    }

    for draft in &drafts.created {
        lines.push(format!("  draft created: {} ({})", draft.draft_id, draft.title));
    }
    if let Some(err) = &drafts.error {
        lines.push(format!("  drafts not created ({}): {err}", err.kind()));
    }

    lines.join("\n")
}

pub fn triage_failure(id: &str, err: &AppError) -> String {
    format!("{id} [FAILED]\n  {}: {err}", err.kind())
}

pub fn format_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return "(no preview)".to_string();
    }

    if compact.chars().count() <= PREVIEW_CHARS {
        return compact;
    }

    let truncated = compact.chars().take(PREVIEW_CHARS).collect::<String>();
    format!("{truncated}...")
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "(no date)".to_string())
}

fn join_labels(message: &Message) -> String {
    message.labels.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
