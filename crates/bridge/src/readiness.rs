use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

/// Bounded fallback used while waiting for the module to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl WaitPolicy {
    pub fn ceiling(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_attempts)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_attempts: 20,
        }
    }
}

/// Readiness flag shared between the bridge and whatever hosts the
/// execution module. The host calls `mark_ready` once initialization has
/// completed; waiters are woken through a channel instead of sleeping out
/// the full poll interval.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    ready: AtomicBool,
    notify_tx: Sender<()>,
    notify_rx: Receiver<()>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (notify_tx, notify_rx) = unbounded();
        Self {
            inner: Arc::new(GateInner {
                ready: AtomicBool::new(false),
                notify_tx,
                notify_rx,
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    pub fn mark_ready(&self) {
        self.inner.ready.store(true, Ordering::SeqCst);
        let _ = self.inner.notify_tx.send(());
    }

    /// Closes the gate again, e.g. when the module is torn down.
    pub fn reset(&self) {
        self.inner.ready.store(false, Ordering::SeqCst);
        while self.inner.notify_rx.try_recv().is_ok() {}
    }

    /// Blocks for at most `policy.ceiling()`, returning whether the gate
    /// opened in time.
    pub fn wait(&self, policy: WaitPolicy) -> bool {
        for _ in 0..policy.max_attempts {
            if self.is_ready() {
                return true;
            }
            match self.inner.notify_rx.recv_timeout(policy.poll_interval) {
                Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.is_ready()
    }
}
