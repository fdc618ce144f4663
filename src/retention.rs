//! Retention pruning of events that ended before the cutoff

use crate::error::Result;
use crate::storage::EventStore;
use crate::window::shift_months;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Removes completed events older than a calendar-month retention window
///
/// The cutoff is `now - retention_months`, computed on the calendar with
/// overflow rolling forward (12 months back from Feb 29 lands on Mar 1).
pub struct RetentionPruner {
    store: Arc<dyn EventStore>,
    retention_months: u32,
}

impl RetentionPruner {
    pub fn new(store: Arc<dyn EventStore>, retention_months: u32) -> Self {
        Self {
            store,
            retention_months,
        }
    }

    /// The instant before which a finished event is pruned
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i32::try_from(self.retention_months)
            .ok()
            .and_then(|months| shift_months(now, -months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Delete every event with `end_time < cutoff(now)`
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = self.cutoff(now);
        let removed = self.store.prune_before(cutoff).await?;

        tracing::info!(cutoff = %cutoff, removed, "Old events pruned");
        Ok(removed)
    }
}
