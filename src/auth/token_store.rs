use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::AppPaths;
use crate::error::{AppError, AppResult};

use super::GmailToken;

pub const TOKEN_ENV_VAR: &str = "GMAIL_TOKEN_JSON";

pub trait TokenStore {
    fn load(&self, profile: &str) -> AppResult<Option<GmailToken>>;
    fn save(&self, profile: &str, token: &GmailToken) -> AppResult<()>;
}

/// Token documents under the data dir, one per profile.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    paths: AppPaths,
}

impl FileTokenStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    pub fn path(&self, profile: &str) -> PathBuf {
        self.paths.token_file(profile)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, profile: &str) -> AppResult<Option<GmailToken>> {
        let path = self.path(profile);
        if !path.exists() {
            return Ok(None);
        }

        debug!(path = %path.display(), "loading gmail token");
        let raw = fs::read_to_string(&path)?;
        let token = serde_json::from_str(&raw).map_err(|err| {
            AppError::Config(format!("invalid gmail token file {}: {err}", path.display()))
        })?;
        Ok(Some(token))
    }

    fn save(&self, profile: &str, token: &GmailToken) -> AppResult<()> {
        let path = self.path(profile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_string_pretty(token)?;
        fs::write(&path, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }
}

/// Parses an inline token document, as passed through the environment.
pub fn token_from_json(raw: &str) -> AppResult<GmailToken> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::Config(format!("{TOKEN_ENV_VAR} is not a valid token document: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_and_reloads_profile_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileTokenStore::new(AppPaths::rooted(dir.path().join("cfg"), dir.path().join("data")));

        assert!(store.load("work").expect("load").is_none());

        let token = GmailToken {
            token: Some("ya29.abc".to_string()),
            refresh_token: Some("1//r".to_string()),
            ..GmailToken::default()
        };
        store.save("work", &token).expect("save");

        let loaded = store.load("work").expect("load").expect("token present");
        assert_eq!(loaded.access_token(), Some("ya29.abc"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path("work")).expect("meta").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn rejects_garbage_inline_token() {
        let err = token_from_json("not json").expect_err("invalid");
        assert!(matches!(err, AppError::Config(_)));
    }
}
