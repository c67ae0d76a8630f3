use std::fs;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

const APP_DIR: &str = "mail-triage";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    profiles_dir: PathBuf,
    tokens_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> AppResult<Self> {
        let config_root = dirs::config_dir()
            .ok_or_else(|| AppError::Config("unable to resolve config directory".to_string()))?;
        let data_root = dirs::data_dir()
            .ok_or_else(|| AppError::Config("unable to resolve data directory".to_string()))?;

        let paths = Self::rooted(config_root.join(APP_DIR), data_root.join(APP_DIR));
        fs::create_dir_all(&paths.profiles_dir)?;
        fs::create_dir_all(&paths.tokens_dir)?;
        Ok(paths)
    }

    /// Paths under explicit roots; nothing is created on disk.
    pub fn rooted(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            profiles_dir: config_dir.join("profiles"),
            tokens_dir: data_dir.join("tokens"),
            config_dir,
        }
    }

    pub fn settings_file(&self, profile: &str) -> PathBuf {
        self.profiles_dir.join(format!("{profile}.json"))
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.config_dir.join("secrets.json")
    }

    pub fn token_file(&self, profile: &str) -> PathBuf {
        self.tokens_dir.join(format!("{profile}.json"))
    }
}
