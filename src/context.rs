use secrecy::{ExposeSecret, SecretString};

use crate::api::GmailClient;
use crate::auth::{AuthService, FileTokenStore};
use crate::cli::Overrides;
use crate::config::{self, AppPaths, FileSecretStore, Settings, SourceKind};
use crate::error::AppResult;
use crate::llm::{self, JsonModelClient, MockBackend, ModelBackend, models};
use crate::mail::{DemoMailSource, GmailMailSource, MailSource};
use crate::output::Output;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub paths: AppPaths,
    pub settings: Settings,
    pub output: Output,
    api_key: Option<SecretString>,
    mock: bool,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, overrides: Overrides) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let mut settings = config::load_settings(&paths, &profile)?;
        let Overrides {
            source,
            inbox,
            backend,
            model,
            api_key,
            timeout,
            mock,
        } = overrides;

        apply_overrides(&mut settings, source, inbox, backend, model, timeout);

        Ok(Self {
            profile,
            paths,
            settings,
            output: Output::new(json),
            api_key: api_key.map(SecretString::from),
            mock,
        })
    }

    /// Opens the configured mailbox. The live source resolves its token here.
    pub async fn mail_source(&self) -> AppResult<Box<dyn MailSource>> {
        match self.settings.source() {
            SourceKind::Demo => Ok(Box::new(DemoMailSource::load(self.settings.inbox_path())?)),
            SourceKind::Gmail => {
                let store = FileTokenStore::new(self.paths.clone());
                let token = AuthService::access_token(&self.profile, &self.settings, &store).await?;
                Ok(Box::new(GmailMailSource::new(GmailClient::new(), token)))
            }
        }
    }

    /// Builds the model client once per invocation; the credential is checked here.
    pub fn model_client(&self) -> AppResult<JsonModelClient> {
        let kind = self.settings.backend();
        let backend: Box<dyn ModelBackend> = if self.mock {
            Box::new(MockBackend::canned())
        } else {
            let secrets = FileSecretStore::new(self.paths.secrets_file());
            llm::connect(
                kind,
                self.api_key.as_ref().map(|key| key.expose_secret()),
                &secrets,
                self.settings.base_url(kind),
            )?
        };

        Ok(JsonModelClient::new(
            backend,
            self.settings.model(),
            self.settings.timeout(),
        ))
    }
}

fn apply_overrides(
    settings: &mut Settings,
    source: Option<SourceKind>,
    inbox: Option<std::path::PathBuf>,
    backend: Option<llm::BackendKind>,
    model: Option<String>,
    timeout: Option<u64>,
) {
    if let Some(source) = source {
        settings.source = Some(source);
    }
    if let Some(inbox) = inbox {
        settings.inbox_path = Some(inbox);
    }
    if let Some(backend) = backend {
        if settings.backend() != backend && model.is_none() {
            settings.model = Some(models::default_model(backend).to_string());
        }
        settings.backend = Some(backend);
    }
    if let Some(model) = model {
        settings.model = Some(model);
    }
    if let Some(timeout) = timeout {
        settings.timeout_secs = Some(timeout);
    }
}
