use secrecy::SecretString;

use crate::config::SecretStore;
use crate::error::{AppError, AppResult};

use super::BackendKind;

/// Resolves an api key: explicit value, then environment, then the secrets store.
/// The first non-blank value wins.
pub fn resolve_api_key(
    backend: BackendKind,
    explicit: Option<&str>,
    secrets: &dyn SecretStore,
) -> AppResult<SecretString> {
    resolve_api_key_with(backend, explicit, |name| std::env::var(name).ok(), secrets)
}

pub fn resolve_api_key_with(
    backend: BackendKind,
    explicit: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    secrets: &dyn SecretStore,
) -> AppResult<SecretString> {
    let env_var = backend.env_var();

    let found = non_blank(explicit.map(ToOwned::to_owned))
        .or_else(|| non_blank(env(env_var)))
        .map(Ok)
        .or_else(|| secrets.get(env_var).map(non_blank).transpose())
        .transpose()?;

    found
        .map(SecretString::from)
        .ok_or(AppError::MissingCredential {
            backend: backend.name(),
            env_var,
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
