use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};

use super::GmailToken;

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges the stored refresh token for a fresh access token.
///
/// The returned document keeps the refresh token and client fields of `current`.
pub async fn refresh_access_token(current: &GmailToken) -> AppResult<GmailToken> {
    let refresh_token = current.refresh_token.as_deref().ok_or_else(|| {
        AppError::Auth("gmail access token expired and no refresh token is stored".to_string())
    })?;
    let client_id = current.client_id.as_deref().ok_or_else(|| {
        AppError::Auth(
            "gmail token refresh needs a client_id (token document or gmail_client_id setting)"
                .to_string(),
        )
    })?;

    let mut form = HashMap::from([
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", refresh_token.to_string()),
        ("client_id", client_id.to_string()),
    ]);

    if let Some(client_secret) = &current.client_secret {
        form.insert("client_secret", client_secret.clone());
    }

    info!(token_uri = current.token_uri(), "refreshing gmail access token");
    let response = reqwest::Client::new()
        .post(current.token_uri())
        .form(&form)
        .send()
        .await?;

    let payload = parse_token_response(response).await?;

    let mut refreshed = current.clone();
    refreshed.token = Some(payload.access_token);
    refreshed.expiry = payload
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs));
    if let Some(rotated) = payload.refresh_token {
        refreshed.refresh_token = Some(rotated);
    }
    if let Some(scope) = payload.scope {
        refreshed.scopes = scope.split_whitespace().map(ToOwned::to_owned).collect();
    }

    Ok(refreshed)
}

async fn parse_token_response(response: reqwest::Response) -> AppResult<OAuthTokenResponse> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|err| AppError::Auth(format!("unexpected token response: {err}")));
    }

    Err(AppError::Auth(token_error_message(status, &body)))
}

fn token_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err_payload) = serde_json::from_str::<OAuthErrorResponse>(body) {
        let error = err_payload
            .error
            .unwrap_or_else(|| "unknown_oauth_error".to_string());
        let description = err_payload
            .error_description
            .unwrap_or_else(|| "no description".to_string());
        return format!("gmail token refresh failed ({status}): {error} ({description})");
    }

    format!("gmail token refresh failed ({status}): {body}")
}
