use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing credential: no {backend} api key (pass --api-key, set {env_var}, or add it to secrets.json)")]
    MissingCredential {
        backend: &'static str,
        env_var: &'static str,
    },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("schema violation on `{field}`: {constraint}")]
    SchemaViolation { field: String, constraint: String },
    #[error("message not found: {0}")]
    NotFound(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("triage failed for {failed} of {total} messages")]
    TriageIncomplete { failed: usize, total: usize },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    pub fn schema(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Whether repeating the whole call may succeed without caller intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_)
                | Self::SchemaViolation { .. }
                | Self::Timeout(_)
                | Self::Api(_)
                | Self::Http(_)
        )
    }

    /// Short, stable name of the error kind for presentation layers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::MalformedResponse(_) => "malformed_response",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::TriageIncomplete { .. } => "triage_incomplete",
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::Api(_) | Self::Http(_) => "api",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Url(_) => "url",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(err.to_string());
        }

        Self::Http(err)
    }
}
