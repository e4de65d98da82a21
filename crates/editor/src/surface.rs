use std::time::{Duration, Instant};

use scheduler::Debounce;
use tracing::{debug, trace};

use crate::includes::{include_completion, IncludeCompleter, ModuleManifest};
use crate::widget::TextWidget;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const ERROR_LINE_CLASS: &str = "line-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Fragment,
    Vertex,
}

impl BufferKind {
    pub fn syntax_mode(self) -> SyntaxMode {
        match self {
            BufferKind::Fragment => SyntaxMode::Fragment,
            BufferKind::Vertex => SyntaxMode::Vertex,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BufferKind::Fragment => "fragment",
            BufferKind::Vertex => "vertex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxMode {
    Fragment,
    Vertex,
}

impl SyntaxMode {
    pub fn mime(self) -> &'static str {
        match self {
            SyntaxMode::Fragment => "x-shader/x-fragment",
            SyntaxMode::Vertex => "x-shader/x-vertex",
        }
    }
}

/// Emitted once per settled edit burst, carrying the new buffer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub kind: BufferKind,
    pub source: String,
}

#[derive(Debug, Default)]
struct Slots {
    fragment: String,
    vertex: String,
}

impl Slots {
    fn get(&self, kind: BufferKind) -> &String {
        match kind {
            BufferKind::Fragment => &self.fragment,
            BufferKind::Vertex => &self.vertex,
        }
    }

    fn get_mut(&mut self, kind: BufferKind) -> &mut String {
        match kind {
            BufferKind::Fragment => &mut self.fragment,
            BufferKind::Vertex => &mut self.vertex,
        }
    }
}

/// Two shader buffers sharing one text widget.
///
/// `buffers` holds the content of each tab. `settled` holds the text last
/// reported (or written programmatically) and is what a fired debounce
/// compares against, so reads never swallow a pending notice.
pub struct EditorSurface<W: TextWidget> {
    widget: W,
    active: BufferKind,
    buffers: Slots,
    settled: Slots,
    debounce: Debounce,
    includes: Option<IncludeCompleter>,
}

impl<W: TextWidget> EditorSurface<W> {
    pub fn new(mut widget: W) -> Self {
        widget.set_mode(BufferKind::Fragment.syntax_mode().mime());
        Self {
            widget,
            active: BufferKind::Fragment,
            buffers: Slots::default(),
            settled: Slots::default(),
            debounce: Debounce::new(DEFAULT_DEBOUNCE),
            includes: None,
        }
    }

    pub fn with_includes(mut self, manifest: Box<dyn ModuleManifest>) -> Self {
        self.includes = Some(IncludeCompleter::new(manifest));
        self
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn active(&self) -> BufferKind {
        self.active
    }

    pub fn value(&self) -> String {
        self.widget.text()
    }

    pub fn set_value(&mut self, text: &str) {
        self.widget.set_text(text);
        *self.buffers.get_mut(self.active) = text.to_string();
        *self.settled.get_mut(self.active) = text.to_string();
    }

    pub fn content(&mut self, kind: BufferKind) -> String {
        if kind == self.active {
            *self.buffers.get_mut(kind) = self.widget.text();
        }
        self.buffers.get(kind).clone()
    }

    pub fn active_content(&mut self) -> String {
        self.content(self.active)
    }

    pub fn set_content(&mut self, kind: BufferKind, text: &str) {
        *self.buffers.get_mut(kind) = text.to_string();
        *self.settled.get_mut(kind) = text.to_string();
        if kind == self.active {
            self.widget.set_text(text);
        }
    }

    pub fn switch_tab(&mut self, kind: BufferKind) -> Option<ChangeNotice> {
        if kind == self.active {
            return None;
        }
        let notice = if self.debounce.flush() {
            self.settle()
        } else {
            None
        };

        *self.buffers.get_mut(self.active) = self.widget.text();
        self.active = kind;
        self.widget.set_mode(kind.syntax_mode().mime());
        let incoming = self.buffers.get(kind).clone();
        self.widget.set_text(&incoming);
        debug!(tab = kind.label(), "switched editor tab");
        notice
    }

    pub fn debounce(&self) -> Duration {
        self.debounce.delay()
    }

    pub fn set_debounce(&mut self, delay: Duration) {
        self.debounce.set_delay(delay);
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Called for every content-changing edit made through the widget.
    pub fn handle_edit(&mut self, now: Instant) {
        self.clear_errors();
        self.debounce.restart(now);
        self.complete_includes();
    }

    pub fn tick(&mut self, now: Instant) -> Option<ChangeNotice> {
        if self.debounce.fire_if_due(now) {
            self.settle()
        } else {
            None
        }
    }

    fn settle(&mut self) -> Option<ChangeNotice> {
        let live = self.widget.text();
        if live == *self.settled.get(self.active) {
            trace!("debounced edit left text unchanged");
            return None;
        }
        *self.buffers.get_mut(self.active) = live.clone();
        *self.settled.get_mut(self.active) = live.clone();
        Some(ChangeNotice {
            kind: self.active,
            source: live,
        })
    }

    /// Decorates the line named by a `0:<line>:<message>` compile error.
    /// Returns whether a line was marked.
    pub fn apply_error_event(&mut self, event: &str) -> bool {
        let Some(line) = error_line(event) else {
            trace!(event, "ignoring unrecognised error event");
            return false;
        };
        if line >= self.widget.line_count() {
            return false;
        }
        self.widget.add_line_class(line, ERROR_LINE_CLASS);
        true
    }

    pub fn clear_errors(&mut self) {
        self.widget.clear_line_classes(ERROR_LINE_CLASS);
    }

    fn complete_includes(&mut self) {
        let Some(completer) = self.includes.as_mut() else {
            return;
        };
        let cursor = self.widget.cursor();
        let Some(line) = self.widget.line(cursor.line) else {
            return;
        };
        let before: String = line.chars().take(cursor.ch).collect();
        if !before.trim_start().starts_with(crate::includes::INCLUDE_DIRECTIVE) {
            return;
        }
        let Some(modules) = completer.modules() else {
            return;
        };
        if let Some(completion) = include_completion(&line, cursor, modules) {
            self.widget.show_completions(completion);
        }
    }
}

/// Zero-based line for an error event of the form `0:<line>:<message>`,
/// optionally prefixed with `ERROR:`.
pub fn error_line(event: &str) -> Option<usize> {
    let trimmed = event.trim();
    let body = trimmed
        .strip_prefix("ERROR:")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    let mut parts = body.splitn(3, ':');
    parts.next()?.trim().parse::<u32>().ok()?;
    let line = parts.next()?.trim().parse::<usize>().ok()?;
    parts.next()?;
    Some(line.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::includes::ManifestError;
    use crate::widget::{Cursor, MemoryWidget};

    fn surface() -> EditorSurface<MemoryWidget> {
        EditorSurface::new(MemoryWidget::new())
    }

    fn edit(surface: &mut EditorSurface<MemoryWidget>, text: &str, now: Instant) {
        surface.widget_mut().type_text(text);
        surface.handle_edit(now);
    }

    #[test]
    fn burst_of_edits_yields_one_notice_after_quiet_period() {
        let mut surface = surface();
        let start = Instant::now();
        let mut last = start;
        for i in 0..5u64 {
            last = start + Duration::from_millis(50 * i);
            edit(&mut surface, &"x".repeat(i as usize + 1), last);
            assert_eq!(surface.tick(last), None);
        }

        assert_eq!(surface.tick(last + Duration::from_millis(299)), None);
        let notice = surface.tick(last + Duration::from_millis(300)).unwrap();
        assert_eq!(notice.kind, BufferKind::Fragment);
        assert_eq!(notice.source, "xxxxx");
        assert_eq!(surface.tick(last + Duration::from_secs(5)), None);
    }

    #[test]
    fn unchanged_text_does_not_notify() {
        let mut surface = surface();
        surface.set_value("void main() {}");
        let now = Instant::now();
        edit(&mut surface, "void main() {}", now);
        assert_eq!(surface.tick(now + DEFAULT_DEBOUNCE), None);
    }

    #[test]
    fn reading_content_does_not_swallow_pending_notice() {
        let mut surface = surface();
        let now = Instant::now();
        edit(&mut surface, "a", now);
        assert_eq!(surface.active_content(), "a");
        assert!(surface.tick(now + DEFAULT_DEBOUNCE).is_some());
    }

    #[test]
    fn switching_tabs_preserves_each_buffer() {
        let mut surface = surface();
        surface.set_content(BufferKind::Fragment, "frag");
        surface.set_content(BufferKind::Vertex, "vert");
        assert_eq!(surface.value(), "frag");

        assert_eq!(surface.switch_tab(BufferKind::Vertex), None);
        assert_eq!(surface.value(), "vert");
        assert_eq!(surface.widget().mode(), "x-shader/x-vertex");
        assert_eq!(surface.switch_tab(BufferKind::Vertex), None);
        assert_eq!(surface.value(), "vert");

        surface.switch_tab(BufferKind::Fragment);
        assert_eq!(surface.value(), "frag");
        assert_eq!(surface.content(BufferKind::Vertex), "vert");
    }

    #[test]
    fn switching_flushes_pending_edit() {
        let mut surface = surface();
        let now = Instant::now();
        edit(&mut surface, "edited", now);
        let notice = surface.switch_tab(BufferKind::Vertex).unwrap();
        assert_eq!(notice.kind, BufferKind::Fragment);
        assert_eq!(notice.source, "edited");
        assert_eq!(surface.pending_deadline(), None);
        assert_eq!(surface.content(BufferKind::Fragment), "edited");
    }

    #[test]
    fn inactive_set_content_leaves_widget_alone() {
        let mut surface = surface();
        surface.set_value("live");
        surface.set_content(BufferKind::Vertex, "hidden");
        assert_eq!(surface.value(), "live");
        assert_eq!(surface.content(BufferKind::Vertex), "hidden");
    }

    #[test]
    fn error_events_map_to_zero_based_lines() {
        assert_eq!(error_line("0:12: 'foo' : undeclared identifier"), Some(11));
        assert_eq!(error_line("0:0: bad"), Some(0));
        assert_eq!(error_line("ERROR: 0:3: syntax error"), Some(2));
        assert_eq!(error_line("link failed"), None);
        assert_eq!(error_line("0:x: nope"), None);
    }

    #[test]
    fn out_of_range_errors_are_ignored() {
        let mut surface = surface();
        surface.set_value("one\ntwo\nthree");
        assert!(surface.apply_error_event("0:2: oops"));
        assert!(!surface.apply_error_event("0:40: oops"));
        assert_eq!(surface.widget().lines_with_class(ERROR_LINE_CLASS), vec![1]);

        surface.handle_edit(Instant::now());
        assert!(surface.widget().lines_with_class(ERROR_LINE_CLASS).is_empty());
    }

    struct FlakyManifest {
        calls: std::cell::Cell<u32>,
    }

    impl ModuleManifest for FlakyManifest {
        fn fetch(&self) -> Result<Vec<String>, ManifestError> {
            let calls = self.calls.get() + 1;
            self.calls.set(calls);
            if calls == 1 {
                return Err(ManifestError::Fetch {
                    url: "https://lygia.xyz/glsl.json".into(),
                    message: "offline".into(),
                });
            }
            Ok(vec!["lygia/math/const.glsl".into()])
        }
    }

    #[test]
    fn include_completion_retries_after_failed_fetch() {
        let mut surface = surface().with_includes(Box::new(FlakyManifest {
            calls: std::cell::Cell::new(0),
        }));
        let now = Instant::now();
        edit(&mut surface, "#include \"lygia/", now);
        assert!(surface.widget().completion().is_none());

        edit(&mut surface, "#include \"lygia/m", now);
        let completion = surface.widget().completion().unwrap();
        assert_eq!(completion.items, vec!["#include \"lygia/math/const.glsl\""]);
        assert_eq!(completion.to, Cursor::new(0, 17));
    }
}
