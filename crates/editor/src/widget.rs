use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub line: usize,
    /// Character (not byte) offset within the line.
    pub ch: usize,
}

impl Cursor {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Completion list offered by the editor; accepting an item replaces the
/// text between `from` and `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub from: Cursor,
    pub to: Cursor,
    pub items: Vec<String>,
}

/// Host text-editing widget. The surface only ever talks to the widget
/// through this trait.
pub trait TextWidget {
    fn text(&self) -> String;
    fn set_text(&mut self, text: &str);
    fn line_count(&self) -> usize;
    fn line(&self, index: usize) -> Option<String>;
    fn cursor(&self) -> Cursor;
    fn set_mode(&mut self, mode: &str);
    fn add_line_class(&mut self, line: usize, class: &str);
    fn clear_line_classes(&mut self, class: &str);
    fn show_completions(&mut self, completion: Completion);
}

/// In-memory widget used by the headless host.
#[derive(Debug, Clone, Default)]
pub struct MemoryWidget {
    text: String,
    cursor: Cursor,
    mode: String,
    line_classes: BTreeMap<String, BTreeSet<usize>>,
    completion: Option<Completion>,
}

impl MemoryWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Replaces the text and leaves the cursor at the end, as typing would.
    pub fn type_text(&mut self, text: &str) {
        self.text = text.to_string();
        let line = self.line_count().saturating_sub(1);
        let ch = self
            .line(line)
            .map(|content| content.chars().count())
            .unwrap_or(0);
        self.cursor = Cursor::new(line, ch);
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn lines_with_class(&self, class: &str) -> Vec<usize> {
        self.line_classes
            .get(class)
            .map(|lines| lines.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }
}

impl TextWidget for MemoryWidget {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = Cursor::default();
    }

    fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    fn line(&self, index: usize) -> Option<String> {
        self.text.split('\n').nth(index).map(str::to_string)
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_mode(&mut self, mode: &str) {
        self.mode = mode.to_string();
    }

    fn add_line_class(&mut self, line: usize, class: &str) {
        self.line_classes
            .entry(class.to_string())
            .or_default()
            .insert(line);
    }

    fn clear_line_classes(&mut self, class: &str) {
        self.line_classes.remove(class);
    }

    fn show_completions(&mut self, completion: Completion) {
        self.completion = Some(completion);
    }
}
