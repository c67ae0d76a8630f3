pub mod oauth;
pub mod token;
pub mod token_store;

use chrono::Utc;
use secrecy::SecretString;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, AppResult};

pub use token::GmailToken;
pub use token_store::{FileTokenStore, TOKEN_ENV_VAR, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenOrigin {
    Env,
    Store,
}

#[derive(Debug, Default)]
pub struct AuthService;

impl AuthService {
    /// Access token for the live mailbox, refreshed when close to expiry.
    ///
    /// `GMAIL_TOKEN_JSON` wins over the profile token file. Only file-backed
    /// tokens are written back after a refresh.
    pub async fn access_token<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<SecretString> {
        let inline = std::env::var(TOKEN_ENV_VAR).ok();
        Self::access_token_with(profile, settings, store, inline.as_deref()).await
    }

    pub async fn access_token_with<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
        inline: Option<&str>,
    ) -> AppResult<SecretString> {
        let (mut token, origin) = match inline.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => (token_store::token_from_json(raw)?, TokenOrigin::Env),
            None => {
                let token = store.load(profile)?.ok_or_else(|| {
                    AppError::Auth(format!(
                        "no gmail token for profile `{profile}`; set {TOKEN_ENV_VAR} or write a token file"
                    ))
                })?;
                (token, TokenOrigin::Store)
            }
        };

        token.fill_client(
            settings.gmail_client_id.as_deref(),
            settings.gmail_client_secret.as_deref(),
        );

        if token.needs_refresh(Utc::now()) {
            token = oauth::refresh_access_token(&token).await?;
            if origin == TokenOrigin::Store {
                store.save(profile, &token)?;
            }
        } else {
            debug!(?origin, "using stored gmail access token");
        }

        let access = token
            .access_token()
            .ok_or_else(|| AppError::Auth("gmail token has no access token".to_string()))?;
        Ok(SecretString::from(access.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::config::AppPaths;

    fn store(dir: &tempfile::TempDir) -> FileTokenStore {
        FileTokenStore::new(AppPaths::rooted(dir.path().join("cfg"), dir.path().join("data")))
    }

    #[tokio::test]
    async fn inline_token_wins_over_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store(&dir);
        store
            .save(
                "default",
                &GmailToken {
                    token: Some("from-file".to_string()),
                    ..GmailToken::default()
                },
            )
            .expect("save");

        let token = AuthService::access_token_with(
            "default",
            &Settings::default(),
            &store,
            Some(r#"{"token":"from-env"}"#),
        )
        .await
        .expect("token");
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[tokio::test]
    async fn falls_back_to_profile_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store(&dir);
        store
            .save(
                "work",
                &GmailToken {
                    token: Some("from-file".to_string()),
                    ..GmailToken::default()
                },
            )
            .expect("save");

        let token = AuthService::access_token_with("work", &Settings::default(), &store, None)
            .await
            .expect("token");
        assert_eq!(token.expose_secret(), "from-file");
    }

    #[tokio::test]
    async fn missing_token_is_auth_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = AuthService::access_token_with("default", &Settings::default(), &store(&dir), None)
            .await
            .expect_err("no token");
        assert!(matches!(err, AppError::Auth(_)));
    }
}
