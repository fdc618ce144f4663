//! Scheduler integration tests
//!
//! Drives full scheduler passes against the in-memory store and channel with
//! a manual clock: horizon selection, retention pruning, partial publish
//! failures, store outages, and the sender downstream.

mod common;

use a3s_calendar::channel::{publish_json, Subscription};
use a3s_calendar::window::TimeWindow;
use a3s_calendar::{
    CalendarError, Event, EventStore, ManualClock, MemoryChannel, MemoryEventStore,
    Notification, NotificationChannel, NotificationScheduler, NotificationSender,
    NotificationStatus, Result, SchedulerConfig, SenderConfig,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    common::at(2024, 11, 20, 12, 0, 0)
}

fn scheduler(
    store: Arc<dyn EventStore>,
    channel: Arc<dyn NotificationChannel>,
) -> NotificationScheduler {
    NotificationScheduler::new(store, channel, SchedulerConfig::default())
        .with_clock(Arc::new(ManualClock::new(now())))
}

async fn notifications(channel: &MemoryChannel) -> Vec<Notification> {
    channel
        .pending("notifications")
        .await
        .iter()
        .map(|payload| serde_json::from_slice(payload).unwrap())
        .collect()
}

/// Fails every second publish
struct FlakyChannel {
    inner: MemoryChannel,
    calls: AtomicUsize,
}

#[async_trait]
impl NotificationChannel for FlakyChannel {
    async fn declare(&self, topic: &str) -> Result<()> {
        self.inner.declare(topic).await
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
            return Err(CalendarError::Publish {
                topic: topic.to_string(),
                reason: "broker rejected message".to_string(),
            });
        }
        self.inner.publish(topic, payload).await
    }

    async fn consume(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        self.inner.consume(topic).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Rejects every publish
struct UnreachableChannel;

#[async_trait]
impl NotificationChannel for UnreachableChannel {
    async fn declare(&self, _topic: &str) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, topic: &str, _payload: Bytes) -> Result<()> {
        Err(CalendarError::Publish {
            topic: topic.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn consume(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        Err(CalendarError::Subscribe {
            topic: topic.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// Store whose reads fail while `down` is set
struct OutageStore {
    inner: MemoryEventStore,
    down: AtomicBool,
}

impl OutageStore {
    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CalendarError::BackendUnavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for OutageStore {
    async fn create(&self, event: &Event) -> Result<()> {
        self.inner.create(event).await
    }

    async fn update(&self, id: Uuid, event: &Event) -> Result<()> {
        self.inner.update(id, event).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn get(&self, id: Uuid) -> Result<Event> {
        self.inner.get(id).await
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        self.check()?;
        self.inner.list_all().await
    }

    async fn list_in(&self, window: TimeWindow) -> Result<Vec<Event>> {
        self.check()?;
        self.inner.list_in(window).await
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check()?;
        self.inner.prune_before(cutoff).await
    }

    fn name(&self) -> &str {
        "outage"
    }
}

#[tokio::test]
async fn test_event_within_horizon_notified_once() {
    let store = Arc::new(MemoryEventStore::new());
    let channel = Arc::new(MemoryChannel::default());
    let soon = common::event("Standup", now() + Duration::hours(1));
    store.create(&soon).await.unwrap();

    let report = scheduler(store, channel.clone()).run_cycle().await;

    assert_eq!(report.notified, 1);
    let sent = notifications(&channel).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event_id, soon.id);
    assert_eq!(sent[0].title, "Standup");
    assert_eq!(sent[0].start_time, soon.start_time.timestamp());
}

#[tokio::test]
async fn test_event_beyond_horizon_not_notified() {
    let store = Arc::new(MemoryEventStore::new());
    let channel = Arc::new(MemoryChannel::default());
    store
        .create(&common::event("Offsite", now() + Duration::hours(48)))
        .await
        .unwrap();

    let report = scheduler(store, channel.clone()).run_cycle().await;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.notified, 0);
    assert!(notifications(&channel).await.is_empty());
}

#[tokio::test]
async fn test_expired_event_pruned() {
    let store = Arc::new(MemoryEventStore::new());
    let channel = Arc::new(MemoryChannel::default());
    let mut ancient = common::event("Retro", now() - Duration::days(400) - Duration::hours(1));
    ancient.end_time = now() - Duration::days(400);
    let recent = common::event("Review", now() - Duration::days(30));
    store.create(&ancient).await.unwrap();
    store.create(&recent).await.unwrap();

    let report = scheduler(store.clone(), channel).run_cycle().await;

    assert_eq!(report.pruned, Some(1));
    assert!(matches!(store.get(ancient.id).await, Err(CalendarError::NotFound(_))));
    let remaining = store.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, recent.id);
}

#[tokio::test]
async fn test_partial_publish_failure_does_not_stop_batch() {
    let store = Arc::new(MemoryEventStore::new());
    let channel = Arc::new(FlakyChannel {
        inner: MemoryChannel::default(),
        calls: AtomicUsize::new(0),
    });
    for i in 0..4 {
        store
            .create(&common::event(&format!("due-{i}"), now() + Duration::minutes(10 * i)))
            .await
            .unwrap();
    }

    let sched = scheduler(store, channel.clone());
    let report = sched.run_cycle().await;

    assert_eq!(report.notified, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.pruned, Some(0));
    assert_eq!(channel.inner.pending("notifications").await.len(), 2);
}

#[tokio::test]
async fn test_prune_runs_when_every_publish_fails() {
    let store = Arc::new(MemoryEventStore::new());
    let due = common::event("Standup", now() + Duration::hours(1));
    let mut ancient = common::event("Retro", now() - Duration::days(400) - Duration::hours(1));
    ancient.end_time = now() - Duration::days(400);
    store.create(&due).await.unwrap();
    store.create(&ancient).await.unwrap();

    let report = scheduler(store.clone(), Arc::new(UnreachableChannel))
        .run_cycle()
        .await;

    assert_eq!(report.notified, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(report.pruned, Some(1));
    assert_eq!(store.list_all().await.unwrap(), vec![due]);
}

#[tokio::test]
async fn test_store_outage_skips_pass_then_recovers() {
    let store = Arc::new(OutageStore {
        inner: MemoryEventStore::new(),
        down: AtomicBool::new(true),
    });
    let channel = Arc::new(MemoryChannel::default());
    store
        .create(&common::event("Sync", now() + Duration::hours(2)))
        .await
        .unwrap();

    let sched = scheduler(store.clone(), channel.clone());

    let report = sched.run_cycle().await;
    assert!(report.scan_failed);
    assert_eq!(report.pruned, None);
    assert!(notifications(&channel).await.is_empty());

    store.down.store(false, Ordering::SeqCst);
    let report = sched.run_cycle().await;
    assert!(!report.scan_failed);
    assert_eq!(report.cycle, 2);
    assert_eq!(notifications(&channel).await.len(), 1);
}

#[tokio::test]
async fn test_scheduler_feeds_sender() {
    let store = Arc::new(MemoryEventStore::new());
    let channel = Arc::new(MemoryChannel::default());
    let due = common::event("Launch", now() + Duration::minutes(30));
    store.create(&due).await.unwrap();

    scheduler(store, channel.clone()).run_cycle().await;

    let sender = NotificationSender::new(channel.clone(), SenderConfig::default());
    let mut subscription = channel.consume("notifications").await.unwrap();
    let delivery = subscription.next().await.unwrap().unwrap();
    let status = sender.process(&delivery).await.unwrap();

    assert_eq!(status, NotificationStatus::processed(due.id));
    let statuses = channel.pending("notification_statuses").await;
    assert_eq!(statuses.len(), 1);
}

#[tokio::test]
async fn test_sender_run_stops_on_cancel() {
    let channel = Arc::new(MemoryChannel::default());
    let sender = NotificationSender::new(channel.clone(), SenderConfig::default());
    let shutdown = CancellationToken::new();

    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { sender.run(shutdown).await })
    };

    let notification = Notification {
        event_id: Uuid::new_v4(),
        title: "Call".to_string(),
        start_time: now().timestamp(),
    };
    publish_json(&*channel, "notifications", &notification)
        .await
        .unwrap();

    for _ in 0..100 {
        if !channel.pending("notification_statuses").await.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    let statuses = channel.pending("notification_statuses").await;
    assert_eq!(statuses.len(), 1);
    let status: NotificationStatus = serde_json::from_slice(&statuses[0]).unwrap();
    assert_eq!(status.event_id, notification.event_id);
}
