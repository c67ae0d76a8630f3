use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::AppResult;

/// Last place credentials are looked up, after explicit flags and the environment.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
}

/// Flat JSON object of `NAME: value` pairs, read on each lookup.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        let mut secrets: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(secrets.remove(key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}
