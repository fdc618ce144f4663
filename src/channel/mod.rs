//! Notification channel abstraction for message transport
//!
//! The scheduler depends only on `NotificationChannel`. Publish is
//! fire-and-forget: success means the message was handed to a durable
//! queue, not that a consumer processed it. Consumption is per-topic
//! ordered and at-least-once; deliveries are acknowledged automatically.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod nats;

pub use memory::{MemoryChannel, MemoryConfig};
pub use nats::{NatsChannel, NatsConfig, StorageType};

/// Core trait for message transports
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Prepare a durable queue for `topic` (idempotent)
    async fn declare(&self, topic: &str) -> Result<()>;

    /// Hand `payload` to the transport for `topic`
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()>;

    /// Start consuming `topic`
    ///
    /// Returns a `Subscription` yielding payloads in publish order.
    async fn consume(&self, topic: &str) -> Result<Box<dyn Subscription>>;

    /// Transport name (e.g., "nats", "memory")
    fn name(&self) -> &str;

    /// Health check: returns true if the transport is connected
    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Async handle for receiving messages from one topic
#[async_trait]
pub trait Subscription: Send {
    /// Receive the next message (auto-ack); `None` when the source is closed
    async fn next(&mut self) -> Result<Option<Delivery>>;
}

/// A message received from a channel
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Topic the message was published to
    pub topic: String,

    /// Raw payload
    pub payload: Bytes,

    /// Transport-assigned sequence number
    pub sequence: u64,

    /// Number of delivery attempts (greater than 1 on redelivery)
    pub num_delivered: u64,
}

impl Delivery {
    /// Decode the payload as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// Serialize `message` as JSON and publish it on `topic`
pub async fn publish_json<T: Serialize + Sync>(
    channel: &dyn NotificationChannel,
    topic: &str,
    message: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    channel.publish(topic, Bytes::from(payload)).await
}

/// Adapt a subscription into a lazy, unbounded stream of deliveries
///
/// The stream ends when the subscription reports the source closed.
pub fn into_stream(
    subscription: Box<dyn Subscription>,
) -> impl Stream<Item = Result<Delivery>> + Send {
    stream::unfold(subscription, |mut sub| async move {
        match sub.next().await {
            Ok(Some(delivery)) => Some((Ok(delivery), sub)),
            Ok(None) => None,
            Err(e) => Some((Err(e), sub)),
        }
    })
}

/// Which transport carries notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelDriver {
    /// Process-local queues
    #[default]
    Memory,
    /// NATS JetStream
    Nats,
}

/// Channel transport settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub driver: ChannelDriver,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub nats: NatsConfig,
}

/// Connect the transport selected by `config.driver`
pub async fn connect(config: &ChannelConfig) -> Result<Arc<dyn NotificationChannel>> {
    let channel: Arc<dyn NotificationChannel> = match config.driver {
        ChannelDriver::Memory => Arc::new(MemoryChannel::new(config.memory.clone())),
        ChannelDriver::Nats => Arc::new(NatsChannel::connect(config.nats.clone()).await?),
    };

    tracing::info!(transport = channel.name(), "Notification channel ready");
    Ok(channel)
}
