//! One-time webhook initialization on cold start.

use std::sync::atomic::{AtomicBool, Ordering};

/// Latch that lets the cold-start registration run at most once per process.
#[derive(Debug, Default)]
pub struct WebhookInitializer {
    enabled: bool,
    started: AtomicBool,
}

impl WebhookInitializer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: AtomicBool::new(false),
        }
    }

    /// Returns true exactly once, for the first caller, when enabled.
    ///
    /// The check-and-set is a single atomic swap, taken before any async
    /// work is scheduled, so concurrent first requests cannot both win.
    pub fn try_begin(&self) -> bool {
        self.enabled && !self.started.swap(true, Ordering::AcqRel)
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}
