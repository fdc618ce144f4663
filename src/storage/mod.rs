//! Event store trait and storage backends
//!
//! Both backends (in-process map, Postgres table) implement `EventStore`
//! with identical observable semantics. All access to the event collection
//! goes through these methods, including retention pruning.

use crate::error::Result;
use crate::types::Event;
use crate::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

mod config;
pub mod memory;
pub mod postgres;

pub use config::{DatabaseConfig, StorageDriver};

/// Core trait for event storage backends
///
/// Operations are linearizable with respect to each other: a read started
/// after a write returns observes that write, and no reader ever sees a
/// partially applied write.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event; fails with `AlreadyExists` on a duplicate id
    async fn create(&self, event: &Event) -> Result<()>;

    /// Replace the full record at `id`; fails with `NotFound` if absent
    ///
    /// The identifier carried by `event` is ignored in favor of `id`.
    async fn update(&self, id: Uuid, event: &Event) -> Result<()>;

    /// Remove the event at `id`; fails with `NotFound` if absent
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Return a copy of the event at `id`; fails with `NotFound` if absent
    async fn get(&self, id: Uuid) -> Result<Event>;

    /// Return every event, order unspecified
    async fn list_all(&self) -> Result<Vec<Event>>;

    /// Return events whose start lies strictly inside `window`, ordered by start
    async fn list_in(&self, window: TimeWindow) -> Result<Vec<Event>>;

    /// Delete every event with `end_time < cutoff`, returning how many were removed
    ///
    /// Idempotent; zero matches is not an error.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Backend name (e.g., "memory", "postgres")
    fn name(&self) -> &str;

    /// Events starting within the UTC day containing `date`
    async fn list_by_day(&self, date: DateTime<Utc>) -> Result<Vec<Event>> {
        self.list_in(TimeWindow::day(date)).await
    }

    /// Events starting within seven days after `start`
    async fn list_by_week(&self, start: DateTime<Utc>) -> Result<Vec<Event>> {
        self.list_in(TimeWindow::week(start)).await
    }

    /// Events starting within one calendar month after `start`
    async fn list_by_month(&self, start: DateTime<Utc>) -> Result<Vec<Event>> {
        self.list_in(TimeWindow::month(start)).await
    }
}

/// Open the backend selected by `config.driver`
pub async fn open(config: &DatabaseConfig) -> Result<Arc<dyn EventStore>> {
    let store: Arc<dyn EventStore> = match config.driver {
        StorageDriver::InMemory => Arc::new(memory::MemoryEventStore::new()),
        StorageDriver::Postgres => Arc::new(postgres::PgEventStore::connect(config).await?),
    };

    tracing::info!(backend = store.name(), "Event store ready");
    Ok(store)
}
