//! In-flight guard
//!
//! Lets only one instance of an async job run at a time. A second caller
//! gets `None` instead of waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    running: Arc<AtomicBool>,
}

/// Held while the job runs; released on drop, including on early return
#[derive(Debug)]
pub struct InFlightGuard {
    running: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { running: self.running.clone() })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
