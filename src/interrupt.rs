//! Process-wide interrupt signaling.
//!
//! A single atomic flag, set once by the signal handler and polled at every
//! suspension point named by the concurrency model: match-finder list pops,
//! encoder sub-range position checks, read completions, and between output
//! chunk writes. All readers use an acquire load so a set flag is visible
//! to every thread without additional synchronization.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheaply cloneable handle to the process's interrupt flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Records that an interrupt was requested. Idempotent.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true if an interrupt has been requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the flag. Only meaningful between sessions in the same
    /// process (e.g. tests); a running session must never call this.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let flag = InterruptFlag::new();
        assert!(!flag.is_set());
    }

    #[test]
    fn set_is_visible_through_clones() {
        let flag = InterruptFlag::new();
        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }

    #[test]
    fn reset_clears_flag() {
        let flag = InterruptFlag::new();
        flag.set();
        flag.reset();
        assert!(!flag.is_set());
    }
}
