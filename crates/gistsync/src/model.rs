//! Shader project document and the derivation history chain stored inside it.
//!
//! Types:
//!
//! - `ShaderProject` is the JSON payload saved into a gist (`frag`, `vert`,
//!   `commands`, `assets`, `history`).
//! - `Owner` is the minimal account record embedded in history entries and
//!   returned by the gist API.
//! - `HistoryEntry` / `History` track which gist a project was derived from;
//!   the first entry is the original author and the last the most recent
//!   editor.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Logical asset name mapped to either an inline data URL or a remote URL.
pub type AssetMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default, alias = "avatar_url")]
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub gist_id: String,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn new(gist_id: impl Into<String>, owner: Option<Owner>) -> Self {
        Self {
            gist_id: gist_id.into(),
            owner,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from raw entries, collapsing repeated ids so that a
    /// later entry replaces the earlier one at its original position.
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            history.record(entry);
        }
        history
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.gist_id == entry.gist_id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&HistoryEntry) -> bool,
    {
        self.entries.retain(keep);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn first(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, gist_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.gist_id == gist_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderProject {
    #[serde(default)]
    pub frag: String,
    #[serde(default)]
    pub vert: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub assets: AssetMap,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ShaderProject {
    pub fn new(frag: impl Into<String>, vert: impl Into<String>) -> Self {
        Self {
            frag: frag.into(),
            vert: vert.into(),
            ..Self::default()
        }
    }

    /// Compares the shader content, ignoring the embedded history.
    pub fn same_content(&self, other: &ShaderProject) -> bool {
        self.frag == other.frag
            && self.vert == other.vert
            && self.commands == other.commands
            && self.assets == other.assets
    }
}
