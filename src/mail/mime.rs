use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::api::models::ReplyContext;

/// A plain-text reply ready to be stored as a Gmail draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftMessage {
    pub to: Option<String>,
    pub subject: String,
    pub body: String,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl DraftMessage {
    pub fn reply(context: &ReplyContext, body: &str) -> Self {
        let subject = ensure_reply_subject(context.subject.as_deref().unwrap_or("(no subject)"));
        let to = context
            .reply_to
            .clone()
            .or_else(|| context.from.clone())
            .map(|value| sanitize_header_value(&value))
            .filter(|value| !value.is_empty());

        Self {
            to,
            subject: sanitize_header_value(&subject),
            body: body.to_string(),
            in_reply_to: context.message_id.clone(),
            references: merge_references(context.references.clone(), context.message_id.clone()),
        }
    }
}

pub fn build_raw_message(draft: &DraftMessage) -> String {
    let mut headers = Vec::new();

    if let Some(to) = &draft.to {
        headers.push(format!("To: {to}"));
    }
    headers.push(format!("Subject: {}", draft.subject));
    if let Some(in_reply_to) = &draft.in_reply_to {
        headers.push(format!("In-Reply-To: {in_reply_to}"));
    }
    if let Some(references) = &draft.references {
        headers.push(format!("References: {references}"));
    }
    headers.push("MIME-Version: 1.0".to_string());
    headers.push("Content-Type: text/plain; charset=utf-8".to_string());

    let payload = format!("{}\r\n\r\n{}", headers.join("\r\n"), draft.body);
    URL_SAFE_NO_PAD.encode(payload.as_bytes())
}

fn ensure_reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.to_ascii_lowercase().starts_with("re:") {
        trimmed.to_string()
    } else {
        format!("Re: {trimmed}")
    }
}

fn merge_references(existing: Option<String>, message_id: Option<String>) -> Option<String> {
    let message_id = message_id?.trim().to_string();
    if message_id.is_empty() {
        return None;
    }

    let mut refs = existing
        .unwrap_or_default()
        .split_whitespace()
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if !refs.iter().any(|value| value == &message_id) {
        refs.push(message_id);
    }

    Some(refs.join(" "))
}

fn sanitize_header_value(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|value| *value != '\r' && *value != '\n')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> String {
        String::from_utf8(URL_SAFE_NO_PAD.decode(raw).expect("base64 decode")).expect("utf8")
    }

    #[test]
    fn reply_draft_threads_onto_parent() {
        let context = ReplyContext {
            subject: Some("Your billing invoice".to_string()),
            from: Some("accounts@example.com".to_string()),
            reply_to: None,
            message_id: Some("<id@example.com>".to_string()),
            references: Some("<ref@example.com>".to_string()),
        };

        let draft = DraftMessage::reply(&context, "Forwarding to finance.");
        let decoded = decode(&build_raw_message(&draft));

        assert!(decoded.contains("To: accounts@example.com"));
        assert!(decoded.contains("Subject: Re: Your billing invoice"));
        assert!(decoded.contains("In-Reply-To: <id@example.com>"));
        assert!(decoded.contains("References: <ref@example.com> <id@example.com>"));
        assert!(decoded.ends_with("\r\n\r\nForwarding to finance."));
    }

    #[test]
    fn keeps_existing_reply_prefix() {
        assert_eq!(ensure_reply_subject("RE: agenda"), "RE: agenda");
        assert_eq!(ensure_reply_subject(" agenda "), "Re: agenda");
    }

    #[test]
    fn prefers_reply_to_and_strips_newlines() {
        let context = ReplyContext {
            subject: None,
            from: Some("hr@example.com".to_string()),
            reply_to: Some("offsite@example.com\r\nBcc: x@evil.test".to_string()),
            message_id: None,
            references: None,
        };

        let draft = DraftMessage::reply(&context, "ok");
        assert_eq!(draft.to.as_deref(), Some("offsite@example.comBcc: x@evil.test"));
        assert_eq!(draft.subject, "Re: (no subject)");
        assert!(draft.references.is_none());
    }
}
