use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide breaker selecting the active presence backing.
///
/// Switching is one-directional: once a durable-backing operation fails the
/// flag flips to local and stays there until the process restarts. No
/// mid-process retry of the durable backing, so the store cannot flap
/// between backings under transient errors.
#[derive(Debug)]
pub struct BackingSelector {
    durable_active: AtomicBool,
}

impl BackingSelector {
    pub fn new() -> Self {
        Self {
            durable_active: AtomicBool::new(true),
        }
    }

    /// True while the durable backing is still the active one. SeqCst so a
    /// trip recorded by any task is seen before the next operation starts.
    pub fn durable_active(&self) -> bool {
        self.durable_active.load(Ordering::SeqCst)
    }

    /// Mark the durable backing inactive. Returns true for the single call
    /// that performed the switch.
    pub fn trip(&self) -> bool {
        self.durable_active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl Default for BackingSelector {
    fn default() -> Self {
        Self::new()
    }
}
