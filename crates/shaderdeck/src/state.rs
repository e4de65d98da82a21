use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gistsync::{LocalStore, StoreError};
use serde::{Deserialize, Serialize};

/// Persisted key/value state (access token, gist history).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub values: BTreeMap<String, String>,
}

impl AppState {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read state file at {}", path.display()))?;
            let state: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse state file at {}", path.display()))?;
            Ok(state)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|err| StoreError::Encode(err.to_string()))?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

/// `LocalStore` backed by the TOML state file; every write is flushed.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    state: AppState,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = AppState::load_or_default(&path)?;
        Ok(Self { path, state })
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state.values.insert(key.to_string(), value.to_string());
        self.state.persist(&self.path)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.state.values.remove(key).is_some() {
            self.state.persist(&self.path)?;
        }
        Ok(())
    }
}
