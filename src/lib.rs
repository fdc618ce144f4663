//! # a3s-calendar
//!
//! Calendar event storage with a background reminder pipeline.
//!
//! ## Overview
//!
//! `a3s-calendar` keeps calendar events behind a backend-agnostic store,
//! answers day/week/month window queries, and runs a scheduler that
//! periodically publishes reminders for upcoming events and prunes events
//! past the retention period. Swap backends (in-memory, PostgreSQL) and
//! channels (in-memory, NATS JetStream) without changing application code.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use a3s_calendar::{Event, EventStore, MemoryChannel, MemoryEventStore};
//! use a3s_calendar::{NotificationScheduler, SchedulerConfig};
//! use chrono::{Duration, Utc};
//!
//! # async fn example() -> a3s_calendar::Result<()> {
//! let store = Arc::new(MemoryEventStore::new());
//! let start = Utc::now() + Duration::hours(1);
//! let end = start + Duration::minutes(15);
//! store
//!     .create(&Event::new("Standup", "", start, end, uuid::Uuid::new_v4()))
//!     .await?;
//!
//! let scheduler = NotificationScheduler::new(
//!     store,
//!     Arc::new(MemoryChannel::default()),
//!     SchedulerConfig::default(),
//! );
//! let report = scheduler.run_cycle().await;
//! assert_eq!(report.notified, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EventStore** trait: CRUD, strict-interval window queries, retention pruning
//! - **NotificationChannel** trait: durable topic publish/consume
//! - **NotificationScheduler**: scan → notify → prune → sleep loop
//! - **NotificationSender**: turns notifications into delivery statuses
//! - **api**: REST transport over the store

pub mod api;
pub mod channel;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod retention;
pub mod scheduler;
pub mod sender;
pub mod storage;
pub mod types;
pub mod window;

// Re-export core types
pub use channel::{Delivery, NotificationChannel, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CalendarConfig;
pub use error::{CalendarError, Result};
pub use retention::RetentionPruner;
pub use scheduler::{
    CycleReport, NotificationScheduler, SchedulerConfig, SchedulerEvent, SchedulerPhase,
};
pub use sender::{NotificationSender, SenderConfig};
pub use storage::EventStore;
pub use types::{Event, Notification, NotificationStatus};
pub use window::TimeWindow;

// Re-export backends for convenience
pub use channel::memory::{MemoryChannel, MemoryConfig};
pub use channel::nats::{NatsChannel, NatsConfig};
pub use storage::memory::MemoryEventStore;
pub use storage::postgres::PgEventStore;
