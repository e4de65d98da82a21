//! Asset sources accepted by the bridge and the helpers that turn them into
//! raw bytes for the module filesystem.
//!
//! Assets arrive as a map of logical file name to either an inline
//! `data:` URL (drag-and-drop, small textures embedded in a gist) or a remote
//! URL. `AssetSource::parse` classifies the value, `AssetFetcher` retrieves
//! remote bytes, and `data_url` re-encodes dropped files so they can be
//! stored back into a project.
use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

pub type AssetMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("malformed data url: {0}")]
    InvalidDataUrl(String),
    #[error("failed to decode base64 asset payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("invalid asset url '{0}'")]
    InvalidUrl(String),
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Inline { mime: String, bytes: Vec<u8> },
    Remote(Url),
}

impl AssetSource {
    pub fn parse(value: &str) -> Result<Self, AssetError> {
        let trimmed = value.trim();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AssetError::InvalidDataUrl("missing ',' separator".into()))?;
            let (mime, is_base64) = match header.strip_suffix(";base64") {
                Some(mime) => (mime, true),
                None => (header, false),
            };
            let bytes = if is_base64 {
                STANDARD.decode(payload.trim())?
            } else {
                payload.as_bytes().to_vec()
            };
            return Ok(Self::Inline {
                mime: mime.to_string(),
                bytes,
            });
        }

        Url::parse(trimmed)
            .map(Self::Remote)
            .map_err(|_| AssetError::InvalidUrl(trimmed.to_string()))
    }
}

/// Retrieves remote asset bytes. `HttpAssetFetcher` is the production
/// implementation.
pub trait AssetFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, AssetError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpAssetFetcher {
    http: Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, AssetError> {
        debug!(%url, "downloading asset");
        let fetch_error = |err: reqwest::Error| AssetError::Fetch {
            url: url.to_string(),
            message: err.to_string(),
        };
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?;
        let bytes = response.bytes().map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }
}

pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "hdr" => "image/vnd.radiance",
        "obj" | "ply" => "text/plain",
        "gltf" => "model/gltf+json",
        "glb" => "model/gltf-binary",
        _ => "application/octet-stream",
    }
}

pub fn data_url(name: &str, bytes: &[u8]) -> String {
    let mime = mime_for_extension(&extension_of(name));
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    Loaded,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub outcomes: Vec<(String, AssetOutcome)>,
}

impl AssetReport {
    pub fn push(&mut self, name: impl Into<String>, outcome: AssetOutcome) {
        self.outcomes.push((name.into(), outcome));
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == AssetOutcome::Loaded)
            .map(|(name, _)| name.as_str())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome != AssetOutcome::Loaded)
            .map(|(name, _)| name.as_str())
    }
}
