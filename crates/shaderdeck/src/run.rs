use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bridge::{Bridge, ReadinessGate};
use deckconfig::DeckConfig;
use editor::{EditorSurface, HttpManifest, MemoryWidget};
use gistsync::{GistClient, HttpGistApi};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::headless::HeadlessModule;
use crate::paths::AppPaths;
use crate::session::Session;
use crate::state::FileStore;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads `config.toml` (or the explicit override). A missing default file
/// yields the built-in settings; a missing explicit file is an error.
pub fn load_config(paths: &AppPaths, explicit: Option<&Path>) -> Result<DeckConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());
    if !path.exists() {
        if explicit.is_some() {
            bail!("config file {} does not exist", path.display());
        }
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(DeckConfig::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    DeckConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config file at {}", path.display()))
}

pub fn build_gist_client(paths: &AppPaths, config: &DeckConfig) -> Result<GistClient> {
    let api = HttpGistApi::new(&config.gist.api_base).context("invalid gist API base URL")?;
    let store = FileStore::open(paths.state_file())?;
    Ok(GistClient::new(Box::new(api), Box::new(store))
        .with_description(config.gist.description.clone()))
}

/// Wires a session around the headless module. Assets land in
/// `export_root` when given.
pub fn build_session(
    config: &DeckConfig,
    gists: GistClient,
    export_root: Option<PathBuf>,
) -> Session<MemoryWidget> {
    let module = match export_root {
        Some(root) => HeadlessModule::with_root(root),
        None => HeadlessModule::new(),
    };
    let gate = ReadinessGate::new();
    let mut bridge = Bridge::new(gate.clone());
    bridge.attach(Box::new(module));
    gate.mark_ready();

    let editor = EditorSurface::new(MemoryWidget::new()).with_includes(Box::new(
        HttpManifest::new(config.editor.include_manifest.clone()),
    ));
    Session::new(editor, bridge, gists, config)
}
