//! In-memory notification channel
//!
//! One FIFO queue per topic. Messages published before anyone consumes are
//! retained; concurrent consumers of the same topic compete for messages.
//! Queues are unbounded unless `max_messages_per_topic` is set, in which case
//! the oldest unconsumed messages are discarded and are never delivered.

use super::{Delivery, NotificationChannel, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};

/// In-memory channel settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Optional per-topic cap (0 = unbounded, the default)
    ///
    /// When set, publishing past the cap discards the oldest messages, so
    /// delivery is no longer at-least-once for a topic nobody drains.
    #[serde(default)]
    pub max_messages_per_topic: usize,
}

#[derive(Default)]
struct TopicQueue {
    messages: Mutex<VecDeque<Delivery>>,
    notify: Notify,
    sequence: AtomicU64,
}

/// Process-local channel for tests and single-process deployments
pub struct MemoryChannel {
    topics: RwLock<HashMap<String, Arc<TopicQueue>>>,
    config: MemoryConfig,
}

impl MemoryChannel {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Payloads waiting on `topic`, oldest first
    pub async fn pending(&self, topic: &str) -> Vec<Bytes> {
        let queue = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(queue) => queue.clone(),
                None => return Vec::new(),
            }
        };
        let messages = queue.messages.lock().await;
        messages.iter().map(|d| d.payload.clone()).collect()
    }

    async fn queue(&self, topic: &str) -> Arc<TopicQueue> {
        if let Some(queue) = self.topics.read().await.get(topic) {
            return queue.clone();
        }
        let mut topics = self.topics.write().await;
        topics.entry(topic.to_string()).or_default().clone()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    async fn declare(&self, topic: &str) -> Result<()> {
        self.queue(topic).await;
        tracing::debug!(topic, "Memory queue declared");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        let queue = self.queue(topic).await;
        let sequence = queue.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut messages = queue.messages.lock().await;
            messages.push_back(Delivery {
                topic: topic.to_string(),
                payload,
                sequence,
                num_delivered: 1,
            });

            let max = self.config.max_messages_per_topic;
            if max > 0 && messages.len() > max {
                let dropped = messages.len() - max;
                messages.drain(..dropped);
                tracing::warn!(topic, dropped, "Memory queue full, oldest messages dropped");
            }
        }

        queue.notify.notify_one();
        tracing::debug!(topic, sequence, "Message published");
        Ok(())
    }

    async fn consume(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let queue = self.queue(topic).await;
        Ok(Box::new(MemorySubscription { queue }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemorySubscription {
    queue: Arc<TopicQueue>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<Delivery>> {
        loop {
            let notified = self.queue.notify.notified();
            if let Some(delivery) = self.queue.messages.lock().await.pop_front() {
                return Ok(Some(delivery));
            }
            notified.await;
        }
    }
}
