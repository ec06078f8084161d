//! Debouncer
//!
//! Per-key quiet windows: every call for a key restarts that key's window,
//! and only its latest action runs, once, after `window` passes without
//! another call. A key is forgotten as soon as its action has run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Scheduled action for one key; `generation` tells a stale task from the
/// one currently registered
struct Scheduled {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slots {
    next_generation: u64,
    scheduled: HashMap<String, Scheduled>,
}

pub struct Debouncer {
    window: Duration,
    slots: Arc<Mutex<Slots>>,
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, slots: Arc::new(Mutex::new(Slots::default())) }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `action` for `key`, replacing whatever was waiting for it
    pub fn call<F>(&self, key: &str, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let slots = Arc::clone(&self.slots);
        let owned_key = key.to_string();

        // Held across spawn so the task cannot finish before it is registered
        let mut guard = lock(&self.slots);
        guard.next_generation += 1;
        let generation = guard.next_generation;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action.await;
            let mut guard = lock(&slots);
            if guard.scheduled.get(&owned_key).is_some_and(|s| s.generation == generation) {
                guard.scheduled.remove(&owned_key);
            }
        });

        if let Some(previous) = guard.scheduled.insert(key.to_string(), Scheduled { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Drop the waiting action for `key` without running it
    pub fn cancel(&self, key: &str) {
        if let Some(scheduled) = lock(&self.slots).scheduled.remove(key) {
            scheduled.handle.abort();
        }
    }

    pub fn cancel_all(&self) {
        for (_, scheduled) in lock(&self.slots).scheduled.drain() {
            scheduled.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.slots)
            .scheduled
            .get(key)
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Keys with an action still waiting or running
    pub fn pending_len(&self) -> usize {
        lock(&self.slots).scheduled.len()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
