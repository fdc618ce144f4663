//! NATS JetStream notification channel
//!
//! Implements `NotificationChannel` using a file-backed JetStream stream
//! and one durable pull consumer per topic, giving ordered at-least-once
//! delivery that survives broker restarts.

mod client;
mod config;
mod subscriber;

pub use client::{NatsClient, StreamInfo};
pub use config::{NatsConfig, StorageType};
pub use subscriber::NatsSubscription;

use crate::channel::{NotificationChannel, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// NATS JetStream channel
///
/// Wraps `NatsClient` and implements the `NotificationChannel` trait.
pub struct NatsChannel {
    client: NatsClient,
}

impl NatsChannel {
    /// Connect to NATS and initialize the JetStream stream
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = NatsClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Get the underlying NATS client for advanced usage
    pub fn client(&self) -> &NatsClient {
        &self.client
    }
}

#[async_trait]
impl NotificationChannel for NatsChannel {
    async fn declare(&self, topic: &str) -> Result<()> {
        self.client.declare(topic).await
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        self.client.publish(topic, payload).await.map(|_| ())
    }

    async fn consume(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let sub = self.client.consume(topic).await?;
        Ok(Box::new(sub))
    }

    fn name(&self) -> &str {
        "nats"
    }

    async fn health(&self) -> Result<bool> {
        self.client.stream_info().await.map(|_| true)
    }
}
