//! Resolves the config and data roots, honouring `SHADERDECK_*` environment
//! overrides before falling back to the platform directories.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "SHADERDECK_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "SHADERDECK_DATA_DIR";

const QUALIFIER: &str = "app";
const ORGANISATION: &str = "shaderdeck";
const APPLICATION: &str = "shaderdeck";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir = resolve_directory(ENV_CONFIG_DIR, project_dirs.config_dir(), "config")?;
        let data_dir = resolve_directory(ENV_DATA_DIR, project_dirs.data_dir(), "data")?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn state_file(&self) -> PathBuf {
        self.config_dir.join("state.toml")
    }

    /// Default export location for `load` when no `--out` is given.
    pub fn project_dir(&self, gist_id: &str) -> PathBuf {
        self.data_dir.join("projects").join(gist_id)
    }
}

fn resolve_directory(env_name: &str, default: &Path, label: &str) -> Result<PathBuf> {
    if let Some(value) = env_override(env_name) {
        return Ok(value);
    }

    let dir = default.to_path_buf();
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| {
            format!(
                "failed to create shaderdeck {label} directory at {}",
                dir.display()
            )
        })?;
    }
    Ok(dir)
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
