pub mod paths;
pub mod profile;
pub mod secrets;
pub mod settings;

pub use paths::AppPaths;
pub use profile::resolve_profile;
pub use secrets::{FileSecretStore, MemorySecretStore, SecretStore};
pub use settings::{Settings, SourceKind};

use crate::error::AppResult;

pub fn load_settings(paths: &AppPaths, profile: &str) -> AppResult<Settings> {
    settings::load(paths.settings_file(profile))
}
