#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub is_error: bool,
}

/// Append-only message pane. Appending always scrolls to the newest line.
#[derive(Debug, Clone, Default)]
pub struct Console {
    lines: Vec<ConsoleLine>,
    scroll_offset: usize,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, text: &str) {
        self.push(text, false);
    }

    pub fn error(&mut self, text: &str) {
        self.push(text, true);
    }

    fn push(&mut self, text: &str, is_error: bool) {
        for line in text.lines() {
            self.lines.push(ConsoleLine {
                text: line.to_string(),
                is_error,
            });
        }
        self.scroll_offset = self.bottom();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset == self.bottom()
    }

    fn bottom(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }
}
