use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bridge::{ExecutionModule, ModuleError};
use tracing::debug;

/// Execution module for the command line. Render toggles live in memory and
/// assets are written into an export directory when one is set.
#[derive(Debug, Default)]
pub struct HeadlessModule {
    root: Option<PathBuf>,
    toggles: BTreeMap<String, String>,
}

impl HeadlessModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }
}

impl ExecutionModule for HeadlessModule {
    fn command(&mut self, command: &str) {
        if let Some((name, value)) = command.split_once(',') {
            if !value.contains(',') {
                self.toggles
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn query(&mut self, name: &str) -> Option<String> {
        self.toggles.get(name).cloned()
    }

    fn set_frag(&mut self, source: &str) {
        debug!(bytes = source.len(), "fragment shader updated");
    }

    fn set_vert(&mut self, source: &str) {
        debug!(bytes = source.len(), "vertex shader updated");
    }

    fn default_scene_frag(&mut self) -> Option<String> {
        None
    }

    fn default_scene_vert(&mut self) -> Option<String> {
        None
    }

    fn write_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ModuleError> {
        let Some(root) = self.root.as_ref() else {
            return Ok(());
        };
        let target = contained_path(root, path).ok_or_else(|| ModuleError::Write {
            path: path.to_string(),
            message: "asset name must be a plain file name".into(),
        })?;
        let write_error = |err: std::io::Error| ModuleError::Write {
            path: path.to_string(),
            message: err.to_string(),
        };
        fs::create_dir_all(root).map_err(write_error)?;
        fs::write(&target, bytes).map_err(write_error)?;
        debug!(path = %target.display(), bytes = bytes.len(), "wrote asset");
        Ok(())
    }

    fn load_asset(&mut self, name: &str, extension: &str) {
        debug!(asset = name, extension, "asset registered");
    }
}

fn contained_path(root: &Path, name: &str) -> Option<PathBuf> {
    let file_name = Path::new(name).file_name()?;
    if file_name.to_str() != Some(name) {
        return None;
    }
    Some(root.join(file_name))
}
