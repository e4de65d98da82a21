use std::time::{Duration, Instant};

/// Delays are clamped to this so a deadline never overflows `Instant`.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Single-instance debounce timer driven by explicit `tick` timestamps.
///
/// Restarting cancels whatever deadline was pending, so only the last
/// trigger inside a window ever fires.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.min(MAX_DELAY),
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay.min(MAX_DELAY);
    }

    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fires immediately if a deadline was pending.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// One-shot delayed action. Scheduling again while pending moves the
/// deadline rather than queueing a second firing.
#[derive(Debug, Clone)]
pub struct Delay {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Delay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.min(MAX_DELAY),
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
