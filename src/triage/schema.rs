//! Typed triage judgment and the validator that produces it from model JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

pub const SUMMARY_MIN_CHARS: usize = 10;
pub const SUMMARY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Mailbox label for this priority. Total over every variant.
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "EA/Priority/High",
            Priority::Medium => "EA/Priority/Med",
            Priority::Low => "EA/Priority/Low",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.as_str() == raw)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestedAction {
    Label { label: String },
    ReplyDraft { title: String, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub summary: String,
    pub priority: Priority,
    pub reasons: Vec<String>,
    pub suggested_actions: Vec<SuggestedAction>,
}

impl TriageResult {
    pub fn label_actions(&self) -> impl Iterator<Item = &str> {
        self.suggested_actions.iter().filter_map(|action| match action {
            SuggestedAction::Label { label } => Some(label.as_str()),
            SuggestedAction::ReplyDraft { .. } => None,
        })
    }

    pub fn reply_drafts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.suggested_actions.iter().filter_map(|action| match action {
            SuggestedAction::ReplyDraft { title, body } => Some((title.as_str(), body.as_str())),
            SuggestedAction::Label { .. } => None,
        })
    }
}

/// Checks `value` against the triage schema. Pure; never mutates its input.
pub fn validate(value: &Value) -> AppResult<TriageResult> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::schema("$", format!("expected a JSON object, got {}", kind(value))))?;

    Ok(TriageResult {
        summary: validate_summary(object)?,
        priority: validate_priority(object)?,
        reasons: validate_reasons(object)?,
        suggested_actions: validate_actions(object)?,
    })
}

fn validate_summary(object: &Map<String, Value>) -> AppResult<String> {
    let summary = match object.get("summary") {
        Some(Value::String(summary)) => summary.trim(),
        Some(other) => {
            return Err(AppError::schema(
                "summary",
                format!("expected a string, got {}", kind(other)),
            ));
        }
        None => return Err(AppError::schema("summary", "field is required")),
    };

    let length = summary.chars().count();
    if length < SUMMARY_MIN_CHARS {
        return Err(AppError::schema(
            "summary",
            format!("length {length} is below the minimum of {SUMMARY_MIN_CHARS} characters"),
        ));
    }
    if length > SUMMARY_MAX_CHARS {
        return Err(AppError::schema(
            "summary",
            format!("length {length} exceeds the maximum of {SUMMARY_MAX_CHARS} characters"),
        ));
    }

    Ok(summary.to_string())
}

fn validate_priority(object: &Map<String, Value>) -> AppResult<Priority> {
    match object.get("priority") {
        Some(Value::String(raw)) => Priority::parse(raw).ok_or_else(|| {
            AppError::schema(
                "priority",
                format!("`{raw}` is not one of high, medium, low"),
            )
        }),
        Some(other) => Err(AppError::schema(
            "priority",
            format!("expected one of high, medium, low, got {}", kind(other)),
        )),
        None => Err(AppError::schema("priority", "field is required")),
    }
}

fn validate_reasons(object: &Map<String, Value>) -> AppResult<Vec<String>> {
    let Some(items) = optional_array(object, "reasons")? else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(reason) => Ok(reason.clone()),
            other => Err(AppError::schema(
                format!("reasons[{index}]"),
                format!("expected a string, got {}", kind(other)),
            )),
        })
        .collect()
}

fn validate_actions(object: &Map<String, Value>) -> AppResult<Vec<SuggestedAction>> {
    let Some(items) = optional_array(object, "suggested_actions")? else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_action(index, item))
        .collect()
}

fn validate_action(index: usize, item: &Value) -> AppResult<SuggestedAction> {
    let path = format!("suggested_actions[{index}]");
    let action = item.as_object().ok_or_else(|| {
        AppError::schema(&path, format!("expected an action object, got {}", kind(item)))
    })?;

    let action_type = match action.get("type") {
        Some(Value::String(action_type)) => action_type.as_str(),
        Some(other) => {
            return Err(AppError::schema(
                format!("{path}.type"),
                format!("expected a string, got {}", kind(other)),
            ));
        }
        None => return Err(AppError::schema(format!("{path}.type"), "field is required")),
    };

    match action_type {
        "label" => {
            let label = required_string(action, &path, "label")?;
            if label.trim().is_empty() {
                return Err(AppError::schema(format!("{path}.label"), "must not be empty"));
            }
            Ok(SuggestedAction::Label {
                label: label.trim().to_string(),
            })
        }
        "reply_draft" => {
            let title = required_string(action, &path, "title")?;
            let body = required_string(action, &path, "body")?;
            if body.trim().is_empty() {
                return Err(AppError::schema(format!("{path}.body"), "must not be empty"));
            }
            Ok(SuggestedAction::ReplyDraft {
                title: title.to_string(),
                body: body.to_string(),
            })
        }
        other => Err(AppError::schema(
            format!("{path}.type"),
            format!("unknown action type `{other}`; expected label or reply_draft"),
        )),
    }
}

/// `None` when the field is absent or null; an error when it is not an array.
fn optional_array<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> AppResult<Option<&'a Vec<Value>>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(AppError::schema(
            field,
            format!("expected an array, got {}", kind(other)),
        )),
    }
}

fn required_string<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    field: &str,
) -> AppResult<&'a str> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(AppError::schema(
            format!("{path}.{field}"),
            format!("expected a string, got {}", kind(other)),
        )),
        None => Err(AppError::schema(format!("{path}.{field}"), "field is required")),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
