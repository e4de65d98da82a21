use std::time::{Duration, Instant};

use scheduler::Delay;
use tracing::debug;

pub const DEFAULT_RESYNC_DELAY: Duration = Duration::from_millis(100);
pub const FULLSCREEN_TOGGLE: &str = "fullscreen";

const ON: &str = "on";
const OFF: &str = "off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    /// Plain `on`/`off` state.
    Flag,
    /// Enumerated state advanced to the next value on each click.
    Cycle(&'static [&'static str]),
    /// Local layout toggle, never sent to the module.
    Fullscreen,
}

pub const VIEW_TOGGLES: &[(&str, ToggleKind)] = &[
    ("axis", ToggleKind::Flag),
    ("bboxes", ToggleKind::Flag),
    (
        "culling",
        ToggleKind::Cycle(&["none", "front", "back", "both"]),
    ),
    ("floor", ToggleKind::Flag),
    ("grid", ToggleKind::Flag),
    ("sky", ToggleKind::Flag),
    (FULLSCREEN_TOGGLE, ToggleKind::Fullscreen),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownAction {
    Command(String),
    ToggleFullscreen,
}

#[derive(Debug, Clone)]
pub struct DropdownRow {
    pub name: &'static str,
    pub kind: ToggleKind,
    pub value: String,
}

impl DropdownRow {
    pub fn is_active(&self) -> bool {
        match self.kind {
            ToggleKind::Cycle(values) => values.first().is_some_and(|first| self.value != *first),
            ToggleKind::Flag | ToggleKind::Fullscreen => self.value == ON,
        }
    }
}

/// View menu whose rows mirror module state. Clicks issue commands
/// immediately and re-read every row once the resync delay elapses, which
/// can race a module that applies the command later than that.
#[derive(Debug, Clone)]
pub struct ViewDropdown {
    rows: Vec<DropdownRow>,
    open: bool,
    resync: Delay,
}

impl Default for ViewDropdown {
    fn default() -> Self {
        Self::new(DEFAULT_RESYNC_DELAY)
    }
}

impl ViewDropdown {
    pub fn new(resync_delay: Duration) -> Self {
        let rows = VIEW_TOGGLES
            .iter()
            .map(|&(name, kind)| DropdownRow {
                name,
                kind,
                value: match kind {
                    ToggleKind::Cycle(values) => values.first().copied().unwrap_or(OFF).to_string(),
                    _ => OFF.to_string(),
                },
            })
            .collect();
        Self {
            rows,
            open: false,
            resync: Delay::new(resync_delay),
        }
    }

    pub fn rows(&self) -> &[DropdownRow] {
        &self.rows
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.row(name).map(|row| row.value.as_str())
    }

    fn row(&self, name: &str) -> Option<&DropdownRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Names of the rows whose state lives in the execution module.
    pub fn toggle_names(&self) -> Vec<&'static str> {
        self.rows
            .iter()
            .filter(|row| row.kind != ToggleKind::Fullscreen)
            .map(|row| row.name)
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opening re-reads every row.
    pub fn toggle_open(&mut self, query: impl FnMut(&str) -> Option<String>) -> bool {
        self.open = !self.open;
        if self.open {
            self.sync(query);
        }
        self.open
    }

    pub fn click(&mut self, name: &str, now: Instant) -> Option<DropdownAction> {
        let row = self.rows.iter_mut().find(|row| row.name == name)?;
        let action = match row.kind {
            ToggleKind::Fullscreen => {
                row.value = flip(&row.value).to_string();
                DropdownAction::ToggleFullscreen
            }
            ToggleKind::Flag => {
                row.value = flip(&row.value).to_string();
                DropdownAction::Command(format!("{},{}", row.name, row.value))
            }
            ToggleKind::Cycle(values) => {
                let next = values
                    .iter()
                    .position(|value| *value == row.value)
                    .map(|index| (index + 1) % values.len())
                    .unwrap_or(0);
                row.value = values.get(next).copied().unwrap_or(OFF).to_string();
                DropdownAction::Command(format!("{},{}", row.name, row.value))
            }
        };
        self.resync.schedule(now);
        debug!(toggle = name, ?action, "view toggle clicked");
        Some(action)
    }

    /// Re-reads all rows once the resync delay has elapsed. Returns whether
    /// a resync ran.
    pub fn tick(&mut self, now: Instant, query: impl FnMut(&str) -> Option<String>) -> bool {
        if !self.resync.fire_if_due(now) {
            return false;
        }
        self.sync(query);
        true
    }

    pub fn sync(&mut self, mut query: impl FnMut(&str) -> Option<String>) {
        for row in self.rows.iter_mut() {
            if row.kind == ToggleKind::Fullscreen {
                continue;
            }
            if let Some(value) = query(row.name) {
                row.value = value.trim().to_string();
            }
        }
    }

    pub fn sync_fullscreen(&mut self, fullscreen: bool) {
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|row| row.kind == ToggleKind::Fullscreen)
        {
            row.value = if fullscreen { ON } else { OFF }.to_string();
        }
    }
}

fn flip(value: &str) -> &'static str {
    if value == ON {
        OFF
    } else {
        ON
    }
}
