//! Notification sender, the downstream consumer of scheduler output
//!
//! Consumes the notification topic and reports a `NotificationStatus` for
//! each message on the status topic. Bad messages are logged and skipped.

use crate::channel::{publish_json, Delivery, NotificationChannel};
use crate::error::Result;
use crate::types::{Notification, NotificationStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Sender settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Topic notifications are consumed from
    #[serde(default = "default_source_topic")]
    pub source_topic: String,

    /// Topic statuses are published to
    #[serde(default = "default_status_topic")]
    pub status_topic: String,
}

fn default_source_topic() -> String {
    "notifications".to_string()
}

fn default_status_topic() -> String {
    "notification_statuses".to_string()
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            source_topic: default_source_topic(),
            status_topic: default_status_topic(),
        }
    }
}

/// Turns notifications into status messages
pub struct NotificationSender {
    channel: Arc<dyn NotificationChannel>,
    config: SenderConfig,
}

impl NotificationSender {
    pub fn new(channel: Arc<dyn NotificationChannel>, config: SenderConfig) -> Self {
        Self { channel, config }
    }

    /// Decode one delivery and publish its status
    pub async fn process(&self, delivery: &Delivery) -> Result<NotificationStatus> {
        let notification: Notification = delivery.decode()?;
        tracing::info!(
            event_id = %notification.event_id,
            title = %notification.title,
            start_time = notification.start_time,
            "Processing notification"
        );

        let status = NotificationStatus::processed(notification.event_id);
        publish_json(self.channel.as_ref(), &self.config.status_topic, &status).await?;
        Ok(status)
    }

    /// Consume until `shutdown` is cancelled or the source closes
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.channel.declare(&self.config.source_topic).await?;
        self.channel.declare(&self.config.status_topic).await?;

        let mut subscription = self.channel.consume(&self.config.source_topic).await?;
        tracing::info!(topic = %self.config.source_topic, "Started consuming notifications");

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = subscription.next() => next,
            };

            match next {
                Ok(Some(delivery)) => match self.process(&delivery).await {
                    Ok(status) => {
                        tracing::info!(event_id = %status.event_id, "Notification processed")
                    }
                    Err(e) => tracing::error!(
                        sequence = delivery.sequence,
                        error = %e,
                        "Failed to process notification"
                    ),
                },
                Ok(None) => {
                    tracing::warn!(topic = %self.config.source_topic, "Notification source closed");
                    break;
                }
                Err(e) => tracing::error!(error = %e, "Failed to receive notification"),
            }
        }

        tracing::info!("Notification sender stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::memory::MemoryChannel;
    use bytes::Bytes;
    use std::time::Duration;
    use uuid::Uuid;

    fn delivery(payload: &'static [u8]) -> Delivery {
        Delivery {
            topic: "notifications".to_string(),
            payload: Bytes::from_static(payload),
            sequence: 1,
            num_delivered: 1,
        }
    }

    #[tokio::test]
    async fn test_process_publishes_status() {
        let channel = Arc::new(MemoryChannel::default());
        let sender = NotificationSender::new(channel.clone(), SenderConfig::default());
        let event_id = Uuid::new_v4();
        let payload = serde_json::to_vec(&Notification {
            event_id,
            title: "Dentist".to_string(),
            start_time: 1_700_000_000,
        })
        .unwrap();

        let status = sender
            .process(&Delivery {
                payload: Bytes::from(payload),
                ..delivery(b"")
            })
            .await
            .unwrap();

        assert_eq!(status, NotificationStatus::processed(event_id));
        let published = channel.pending("notification_statuses").await;
        assert_eq!(published.len(), 1);
        let decoded: NotificationStatus = serde_json::from_slice(&published[0]).unwrap();
        assert_eq!(decoded.event_id, event_id);
    }

    #[tokio::test]
    async fn test_process_rejects_malformed_payload() {
        let channel = Arc::new(MemoryChannel::default());
        let sender = NotificationSender::new(channel.clone(), SenderConfig::default());

        assert!(sender.process(&delivery(b"{not json")).await.is_err());
        assert!(channel.pending("notification_statuses").await.is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_bad_messages() {
        let channel = Arc::new(MemoryChannel::default());
        let good = Notification {
            event_id: Uuid::new_v4(),
            title: "Review".to_string(),
            start_time: 1_700_000_000,
        };
        channel
            .publish("notifications", Bytes::from_static(b"garbage"))
            .await
            .unwrap();
        publish_json(&*channel, "notifications", &good).await.unwrap();

        let sender = Arc::new(NotificationSender::new(channel.clone(), SenderConfig::default()));
        let shutdown = CancellationToken::new();
        let handle = {
            let sender = sender.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { sender.run(shutdown).await })
        };

        let mut statuses = Vec::new();
        for _ in 0..100 {
            statuses = channel.pending("notification_statuses").await;
            if !statuses.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(statuses.len(), 1);
        let status: NotificationStatus = serde_json::from_slice(&statuses[0]).unwrap();
        assert_eq!(status.event_id, good.event_id);
    }
}
