use editor::{BufferKind, ChangeNotice, EditorSurface, TextWidget};
use tracing::debug;

use crate::ids;

pub const SPLIT_CLASS: &str = "layout-split";
pub const FULLSCREEN_CLASS: &str = "layout-fullscreen";

/// Split versus fullscreen canvas. Purely presentational; the execution
/// module is told about size changes by the host, not by the layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layout {
    fullscreen: bool,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen != fullscreen {
            debug!(fullscreen, "layout changed");
        }
        self.fullscreen = fullscreen;
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.set_fullscreen(!self.fullscreen);
        self.fullscreen
    }

    pub fn panels_visible(&self) -> bool {
        !self.fullscreen
    }

    pub fn layout_class(&self) -> &'static str {
        if self.fullscreen {
            FULLSCREEN_CLASS
        } else {
            SPLIT_CLASS
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Editor,
    Console,
    Canvas,
    Other,
}

/// Tracks whether the canvas holds keyboard focus.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusTracker {
    canvas_focused: bool,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas_focused(&self) -> bool {
        self.canvas_focused
    }

    pub fn on_click(&mut self, region: Region) {
        match region {
            Region::Editor | Region::Console => self.canvas_focused = false,
            Region::Canvas => self.canvas_focused = true,
            Region::Other => {}
        }
    }

    pub fn on_canvas_enter(&mut self) {
        self.canvas_focused = true;
    }

    pub fn on_canvas_leave(&mut self) {
        self.canvas_focused = false;
    }

    /// Key events typed into the editor or console must not reach the canvas.
    pub fn key_propagates(&self, region: Region) -> bool {
        !matches!(region, Region::Editor | Region::Console)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TabBar {
    active: BufferKind,
}

impl Default for TabBar {
    fn default() -> Self {
        Self {
            active: BufferKind::Fragment,
        }
    }
}

impl TabBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> BufferKind {
        self.active
    }

    pub fn tab_id(kind: BufferKind) -> &'static str {
        match kind {
            BufferKind::Fragment => ids::TAB_FRAGMENT,
            BufferKind::Vertex => ids::TAB_VERTEX,
        }
    }

    pub fn is_active(&self, kind: BufferKind) -> bool {
        self.active == kind
    }

    /// Leaves fullscreen first so the editor is visible, then switches the
    /// shared editor to `kind`. Returns the notice for a flushed edit.
    pub fn click<W: TextWidget>(
        &mut self,
        kind: BufferKind,
        layout: &mut Layout,
        editor: &mut EditorSurface<W>,
    ) -> Option<ChangeNotice> {
        layout.set_fullscreen(false);
        let notice = editor.switch_tab(kind);
        self.active = editor.active();
        notice
    }
}
