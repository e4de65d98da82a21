use tracing::trace;

/// Reference-counted loading overlay. Nested operations each `show` and
/// `hide`; the overlay stays up until the last one finishes.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    count: usize,
    message: String,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: &str) {
        self.count += 1;
        self.message = message.to_string();
        trace!(count = self.count, message, "loader shown");
    }

    pub fn hide(&mut self) {
        self.count = self.count.saturating_sub(1);
        trace!(count = self.count, "loader hidden");
    }

    pub fn update(&mut self, message: &str) {
        self.message = message.to_string();
    }

    pub fn is_visible(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
