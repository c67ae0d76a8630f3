use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google "authorized user" token document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl GmailToken {
    const EXPIRY_SKEW_SECS: i64 = 30;

    /// True when there is no access token or it expires within the skew window.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        if self.access_token().is_none() {
            return true;
        }

        let Some(expiry) = self.expiry else {
            return false;
        };

        now + Duration::seconds(Self::EXPIRY_SKEW_SECS) >= expiry
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.trim().is_empty())
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URI)
    }

    /// Fills client credentials the document leaves out.
    pub fn fill_client(&mut self, client_id: Option<&str>, client_secret: Option<&str>) {
        if self.client_id.is_none() {
            self.client_id = client_id.map(ToOwned::to_owned);
        }
        if self.client_secret.is_none() {
            self.client_secret = client_secret.map(ToOwned::to_owned);
        }
    }
}
