use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::widget::{Completion, Cursor};

pub const INCLUDE_DIRECTIVE: &str = "#include";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to fetch module manifest from {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("module manifest at {url} is not a list of paths")]
    Format { url: String },
}

/// Source of includable module paths.
pub trait ModuleManifest {
    fn fetch(&self) -> Result<Vec<String>, ManifestError>;
}

#[derive(Debug, Clone)]
pub struct HttpManifest {
    http: Client,
    url: String,
}

impl HttpManifest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

impl ModuleManifest for HttpManifest {
    fn fetch(&self) -> Result<Vec<String>, ManifestError> {
        let fetch_error = |err: reqwest::Error| ManifestError::Fetch {
            url: self.url.clone(),
            message: err.to_string(),
        };
        let body = self
            .http
            .get(&self.url)
            .send()
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?
            .text()
            .map_err(fetch_error)?;
        parse_manifest(&body).ok_or_else(|| ManifestError::Format {
            url: self.url.clone(),
        })
    }
}

/// Accepts a JSON array of strings or one path per line.
pub fn parse_manifest(body: &str) -> Option<Vec<String>> {
    let trimmed = body.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).ok();
    }
    Some(
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Fetches the manifest on first use and keeps it for the session. A failed
/// fetch is retried on the next request.
pub struct IncludeCompleter {
    manifest: Box<dyn ModuleManifest>,
    modules: Option<Vec<String>>,
}

impl IncludeCompleter {
    pub fn new(manifest: Box<dyn ModuleManifest>) -> Self {
        Self {
            manifest,
            modules: None,
        }
    }

    pub fn modules(&mut self) -> Option<&[String]> {
        if self.modules.is_none() {
            match self.manifest.fetch() {
                Ok(modules) => {
                    debug!(count = modules.len(), "loaded include manifest");
                    self.modules = Some(modules);
                }
                Err(err) => {
                    warn!(error = %err, "include manifest unavailable");
                    return None;
                }
            }
        }
        self.modules.as_deref()
    }
}

/// Builds the completion for `line` with the cursor at `cursor.ch`, or `None`
/// when the line does not start with an include directive or nothing
/// matches.
pub fn include_completion(line: &str, cursor: Cursor, modules: &[String]) -> Option<Completion> {
    let before: String = line.chars().take(cursor.ch).collect();
    if !before.trim_start().starts_with(INCLUDE_DIRECTIVE) {
        return None;
    }
    let indent = before.chars().count() - before.trim_start().chars().count();
    let typed = before.trim_start()[INCLUDE_DIRECTIVE.len()..]
        .trim_start()
        .trim_start_matches('"');

    let mut matches: Vec<&String> = modules
        .iter()
        .filter(|module| module.starts_with(typed))
        .collect();
    if matches.is_empty() {
        return None;
    }
    matches.sort();

    let closes_quote = line.chars().nth(cursor.ch) == Some('"');
    let to = if closes_quote {
        Cursor::new(cursor.line, cursor.ch + 1)
    } else {
        cursor
    };
    Some(Completion {
        from: Cursor::new(cursor.line, indent),
        to,
        items: matches
            .into_iter()
            .map(|module| format!("{INCLUDE_DIRECTIVE} \"{module}\""))
            .collect(),
    })
}
