//! NATS JetStream subscription

use super::config::NatsConfig;
use crate::channel::{Delivery, Subscription};
use crate::error::{CalendarError, Result};
use async_nats::jetstream::consumer::pull;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

/// Pull-consumer message stream that acknowledges on delivery
pub struct NatsSubscription {
    messages: pull::Stream,
    config: Arc<NatsConfig>,
}

impl NatsSubscription {
    pub(super) fn new(messages: pull::Stream, config: Arc<NatsConfig>) -> Self {
        Self { messages, config }
    }
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn next(&mut self) -> Result<Option<Delivery>> {
        let msg = match self.messages.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                return Err(CalendarError::BackendUnavailable(format!(
                    "Failed to receive message: {}",
                    e
                )))
            }
            None => return Ok(None),
        };

        let (sequence, num_delivered) = match msg.info() {
            Ok(info) => (info.stream_sequence, info.delivered.max(1) as u64),
            Err(e) => {
                tracing::warn!(error = %e, "Message carries no JetStream metadata");
                (0, 1)
            }
        };

        let subject = msg.subject.to_string();
        let delivery = Delivery {
            topic: self.config.topic_of(&subject).to_string(),
            payload: msg.payload.clone(),
            sequence,
            num_delivered,
        };

        msg.ack()
            .await
            .map_err(|e| CalendarError::Ack(e.to_string()))?;

        Ok(Some(delivery))
    }
}
