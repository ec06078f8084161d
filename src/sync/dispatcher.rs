//! Persistence Dispatcher
//!
//! Sends reorder results to the backend, one request per item, all at once.
//! Waits for every request to settle; a failure never cuts the others short.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::api::{ApiError, RemoteApi};
use crate::domain::OrderUpdate;
use crate::store::{ClientStore, NoticeLevel};

/// Outcome of one dispatch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, ApiError)>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Local state may disagree with the backend; pull fresh data
    pub fn needs_resync(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Persist order updates concurrently. Failures are reported once, as a
/// single notification; nothing is retried or rolled back here.
pub async fn persist_reorder(
    api: Arc<dyn RemoteApi>,
    store: &ClientStore,
    updates: Vec<OrderUpdate>,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    if updates.is_empty() {
        return report;
    }

    let expected: Vec<String> = updates.iter().map(|u| u.id.clone()).collect();
    let mut tasks = JoinSet::new();
    for update in updates {
        let api = api.clone();
        tasks.spawn(async move {
            let result = api.update_order(&update).await;
            (update.id, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(()))) => report.succeeded.push(id),
            Ok((id, Err(e))) => {
                log::warn!("Order update for {} failed: {}", id, e);
                report.failed.push((id, e));
            }
            Err(e) => log::error!("Order update task did not finish: {}", e),
        }
    }

    // Tasks that panicked or were cancelled never reported back
    let settled: HashSet<&String> = report
        .succeeded
        .iter()
        .chain(report.failed.iter().map(|(id, _)| id))
        .collect();
    let lost: Vec<String> = expected
        .iter()
        .filter(|id| !settled.contains(id))
        .cloned()
        .collect();
    for id in lost {
        report.failed.push((id, ApiError::Network("request task aborted".to_string())));
    }

    if !report.failed.is_empty() {
        let first = &report.failed[0].1;
        store.notify(
            NoticeLevel::Error,
            format!(
                "Failed to save order for {} of {} items: {}",
                report.failed.len(),
                report.total(),
                first
            ),
        );
    } else {
        log::debug!("Persisted {} order updates", report.succeeded.len());
    }
    report
}
