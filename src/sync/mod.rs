//! Sync Layer
//!
//! Getting local changes to the backend:
//! - dispatcher: immediate, parallel persistence of reorder results
//! - queue: durable offline log with batch replay
//! - debounce: coalescing of rapid edits
//! - guard: single-flight protection for sync passes

mod debounce;
mod dispatcher;
mod guard;
mod queue;

pub use debounce::Debouncer;
pub use dispatcher::{persist_reorder, DispatchReport};
pub use guard::{InFlight, InFlightGuard};
pub use queue::{batch_order, PendingQueue, SyncError, SyncOutcome, SyncReport, DEFAULT_CAPACITY};
