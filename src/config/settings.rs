use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::llm::BackendKind;
use crate::llm::models;

const DEFAULT_INBOX_PATH: &str = "data/sample_inbox.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MARKER_LABEL: &str = "EA/Summary";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local JSON inbox, mutated in memory only.
    #[default]
    Demo,
    /// Gmail REST API.
    Gmail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub source: Option<SourceKind>,
    #[serde(default)]
    pub inbox_path: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub marker_label: Option<String>,
    #[serde(default)]
    pub gmail_client_id: Option<String>,
    #[serde(default)]
    pub gmail_client_secret: Option<String>,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    #[serde(default)]
    pub anthropic_base_url: Option<String>,
}

impl Settings {
    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    /// Configured model, alias-resolved for the active backend.
    pub fn model(&self) -> String {
        let backend = self.backend();
        let name = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| models::default_model(backend));
        models::resolve_model(backend, name)
    }

    pub fn source(&self) -> SourceKind {
        self.source.unwrap_or_default()
    }

    pub fn inbox_path(&self) -> PathBuf {
        self.inbox_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INBOX_PATH))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn marker_label(&self) -> String {
        self.marker_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_MARKER_LABEL)
            .to_string()
    }

    pub fn base_url(&self, backend: BackendKind) -> Option<&str> {
        match backend {
            BackendKind::OpenAi => self.openai_base_url.as_deref(),
            BackendKind::Anthropic => self.anthropic_base_url.as_deref(),
        }
    }
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}
