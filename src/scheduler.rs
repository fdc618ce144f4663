//! Notification scheduler
//!
//! A single long-lived loop: `Idle → Scanning → Notifying → Pruning →
//! Sleeping → Idle`. Each pass lists every event, publishes one reminder per
//! event starting within the lookahead horizon, then prunes events past the
//! retention cutoff. Failures degrade the current pass only.
//!
//! No delivery state is kept between passes, so an event inside the horizon
//! is re-notified on every pass until it is deleted or pruned.

use crate::channel::{publish_json, NotificationChannel};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::retention::RetentionPruner;
use crate::storage::EventStore;
use crate::types::{Event, Notification};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Largest `horizon_secs` representable as a `TimeDelta`
pub const MAX_HORIZON_SECS: u64 = i64::MAX as u64 / 1000;

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pause between passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Lookahead horizon: events starting sooner than this are notified
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: u64,

    /// Finished events older than this many calendar months are pruned
    #[serde(default = "default_retention_months")]
    pub retention_months: u32,

    /// Topic notifications are published to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Run the scheduler inside the `serve` process
    #[serde(default)]
    pub embedded: bool,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_horizon_secs() -> u64 {
    24 * 60 * 60
}

fn default_retention_months() -> u32 {
    12
}

fn default_topic() -> String {
    "notifications".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            horizon_secs: default_horizon_secs(),
            retention_months: default_retention_months(),
            topic: default_topic(),
            embedded: false,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Lookahead as a signed duration, saturating at `TimeDelta::MAX`
    pub fn horizon(&self) -> TimeDelta {
        i64::try_from(self.horizon_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Scanning,
    Notifying,
    Pruning,
    Sleeping,
}

/// Scheduler events for monitoring
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Loop started
    Started,
    /// Loop stopped after cancellation
    Stopped,
    /// Listing events failed; the pass was skipped
    ScanFailed { error: String },
    /// A notification was handed to the channel
    Notified { event_id: Uuid },
    /// Publishing one notification failed
    PublishFailed { event_id: Uuid, error: String },
    /// Pruning failed
    PruneFailed { error: String },
    /// A pass finished
    CycleCompleted(CycleReport),
}

/// Outcome of a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based pass counter
    pub cycle: u64,
    /// Events returned by the scan
    pub scanned: usize,
    /// Notifications published
    pub notified: usize,
    /// Notifications that failed to publish
    pub failed: usize,
    /// Events pruned, `None` when pruning did not run or failed
    pub pruned: Option<u64>,
    /// The scan failed and nothing else ran
    pub scan_failed: bool,
    /// Cancellation was observed before the pass finished
    pub interrupted: bool,
}

/// Polls the store and emits reminders through a notification channel
pub struct NotificationScheduler {
    store: Arc<dyn EventStore>,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    pruner: RetentionPruner,
    config: SchedulerConfig,
    phase: watch::Sender<SchedulerPhase>,
    event_tx: broadcast::Sender<SchedulerEvent>,
    cycles: AtomicU64,
}

impl NotificationScheduler {
    /// Create a scheduler reading wall-clock time
    pub fn new(
        store: Arc<dyn EventStore>,
        channel: Arc<dyn NotificationChannel>,
        config: SchedulerConfig,
    ) -> Self {
        let (phase, _) = watch::channel(SchedulerPhase::Idle);
        let (event_tx, _) = broadcast::channel(256);
        let pruner = RetentionPruner::new(store.clone(), config.retention_months);

        Self {
            store,
            channel,
            clock: Arc::new(SystemClock),
            pruner,
            config,
            phase,
            event_tx,
            cycles: AtomicU64::new(0),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subscribe to scheduler events
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.event_tx.subscribe()
    }

    /// Current loop phase
    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions
    pub fn watch_phase(&self) -> watch::Receiver<SchedulerPhase> {
        self.phase.subscribe()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether `event` starts within the horizon of `now` (past starts included)
    pub fn is_due(&self, event: &Event, now: DateTime<Utc>) -> bool {
        event.start_time.signed_duration_since(now) < self.config.horizon()
    }

    /// Run one pass without a shutdown signal
    pub async fn run_cycle(&self) -> CycleReport {
        let report = self.cycle(None).await;
        self.set_phase(SchedulerPhase::Idle);
        report
    }

    /// Loop until `shutdown` is cancelled
    ///
    /// Declares the topic first; failing that is the only error returned.
    /// Cancellation is checked between phases and during the sleep.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.channel.declare(&self.config.topic).await?;

        let _ = self.event_tx.send(SchedulerEvent::Started);
        tracing::info!(
            interval_secs = self.config.interval_secs,
            topic = %self.config.topic,
            "Notification scheduler started"
        );

        while !shutdown.is_cancelled() {
            self.cycle(Some(&shutdown)).await;

            self.set_phase(SchedulerPhase::Sleeping);
            tracing::debug!(interval_secs = self.config.interval_secs, "Sleeping");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval()) => {}
            }
            self.set_phase(SchedulerPhase::Idle);
        }

        self.set_phase(SchedulerPhase::Idle);
        let _ = self.event_tx.send(SchedulerEvent::Stopped);
        tracing::info!("Notification scheduler stopped");
        Ok(())
    }

    async fn cycle(&self, shutdown: Option<&CancellationToken>) -> CycleReport {
        let cancelled = || shutdown.is_some_and(|token| token.is_cancelled());
        let mut report = CycleReport {
            cycle: self.cycles.fetch_add(1, Ordering::SeqCst) + 1,
            ..Default::default()
        };

        self.set_phase(SchedulerPhase::Scanning);
        let events = match self.store.list_all().await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list events");
                let _ = self.event_tx.send(SchedulerEvent::ScanFailed {
                    error: e.to_string(),
                });
                report.scan_failed = true;
                return self.finish(report);
            }
        };
        report.scanned = events.len();
        tracing::info!(count = events.len(), "Retrieved events");

        if cancelled() {
            report.interrupted = true;
            return self.finish(report);
        }

        self.set_phase(SchedulerPhase::Notifying);
        let now = self.clock.now();
        for event in events.iter().filter(|e| self.is_due(e, now)) {
            let notification = Notification::for_event(event);
            let published =
                publish_json(self.channel.as_ref(), &self.config.topic, &notification).await;
            match published {
                Ok(()) => {
                    report.notified += 1;
                    tracing::info!(
                        event_id = %event.id,
                        title = %event.title,
                        "Notification published"
                    );
                    let _ = self
                        .event_tx
                        .send(SchedulerEvent::Notified { event_id: event.id });
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        event_id = %event.id,
                        error = %e,
                        "Failed to publish notification"
                    );
                    let _ = self.event_tx.send(SchedulerEvent::PublishFailed {
                        event_id: event.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if cancelled() {
            report.interrupted = true;
            return self.finish(report);
        }

        self.set_phase(SchedulerPhase::Pruning);
        match self.pruner.prune(self.clock.now()).await {
            Ok(removed) => report.pruned = Some(removed),
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete old events");
                let _ = self.event_tx.send(SchedulerEvent::PruneFailed {
                    error: e.to_string(),
                });
            }
        }

        self.finish(report)
    }

    fn finish(&self, report: CycleReport) -> CycleReport {
        tracing::debug!(
            cycle = report.cycle,
            scanned = report.scanned,
            notified = report.notified,
            failed = report.failed,
            "Scheduler pass finished"
        );
        let _ = self.event_tx.send(SchedulerEvent::CycleCompleted(report.clone()));
        report
    }

    fn set_phase(&self, phase: SchedulerPhase) {
        self.phase.send_replace(phase);
    }
}
