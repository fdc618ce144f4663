//! NATS JetStream client: connect, declare, publish, consume

use super::config::{NatsConfig, StorageType};
use super::subscriber::NatsSubscription;
use crate::error::{CalendarError, Result};
use async_nats::jetstream;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// NATS JetStream client
///
/// Manages the connection and the stream that backs every topic.
pub struct NatsClient {
    /// NATS client connection
    client: async_nats::Client,

    /// JetStream context
    jetstream: jetstream::Context,

    /// JetStream stream handle (Mutex for methods requiring &mut self)
    stream: Mutex<jetstream::stream::Stream>,

    config: Arc<NatsConfig>,
}

impl NatsClient {
    /// Connect to NATS and initialize the JetStream stream
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let connect_opts = build_connect_options(&config);

        let client = connect_opts
            .connect(&config.url)
            .await
            .map_err(|e| CalendarError::BackendUnavailable(format!("{}: {}", config.url, e)))?;

        tracing::info!(url = %config.url, "Connected to NATS");

        let jetstream = jetstream::new(client.clone());
        let stream = ensure_stream(&jetstream, &config).await?;

        Ok(Self {
            client,
            jetstream,
            stream: Mutex::new(stream),
            config: Arc::new(config),
        })
    }

    /// Ensure the durable consumer for `topic` exists
    pub async fn declare(&self, topic: &str) -> Result<()> {
        self.durable_consumer(topic).await?;
        tracing::info!(topic, "NATS queue declared");
        Ok(())
    }

    /// Publish a payload and wait for the stream ack, returning its sequence
    pub async fn publish(&self, topic: &str, payload: Bytes) -> Result<u64> {
        let subject = self.config.topic_subject(topic);

        let ack = self
            .jetstream
            .publish(subject.clone(), payload)
            .await
            .map_err(|e| CalendarError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?
            .await
            .map_err(|e| CalendarError::Publish {
                topic: topic.to_string(),
                reason: format!("ack failed: {}", e),
            })?;

        tracing::debug!(
            topic,
            subject = %subject,
            sequence = ack.sequence,
            "Message published"
        );

        Ok(ack.sequence)
    }

    /// Attach to the durable consumer for `topic`
    pub async fn consume(&self, topic: &str) -> Result<NatsSubscription> {
        let consumer = self.durable_consumer(topic).await?;

        let messages = consumer.messages().await.map_err(|e| CalendarError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            topic,
            consumer = %self.config.consumer_name(topic),
            "Durable subscription created"
        );

        Ok(NatsSubscription::new(messages, self.config.clone()))
    }

    /// Get stream info
    pub async fn stream_info(&self) -> Result<StreamInfo> {
        let mut stream = self.stream.lock().await;
        let info = stream
            .info()
            .await
            .map_err(|e| {
                CalendarError::BackendUnavailable(format!("Failed to get stream info: {}", e))
            })?;

        Ok(StreamInfo {
            messages: info.state.messages,
            bytes: info.state.bytes,
            first_sequence: info.state.first_sequence,
            last_sequence: info.state.last_sequence,
            consumer_count: info.state.consumer_count,
        })
    }

    /// Get the underlying NATS client
    pub fn nats_client(&self) -> &async_nats::Client {
        &self.client
    }

    pub fn config(&self) -> &NatsConfig {
        &self.config
    }

    async fn durable_consumer(
        &self,
        topic: &str,
    ) -> Result<jetstream::consumer::Consumer<jetstream::consumer::pull::Config>> {
        let consumer_name = self.config.consumer_name(topic);

        self.stream
            .lock()
            .await
            .get_or_create_consumer(
                &consumer_name,
                jetstream::consumer::pull::Config {
                    durable_name: Some(consumer_name.clone()),
                    filter_subject: self.config.topic_subject(topic),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| CalendarError::Subscribe {
                topic: topic.to_string(),
                reason: format!("failed to create durable consumer '{}': {}", consumer_name, e),
            })
    }
}

/// Summary of stream state
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub messages: u64,
    pub bytes: u64,
    pub first_sequence: u64,
    pub last_sequence: u64,
    pub consumer_count: usize,
}

/// Build NATS connect options from config
fn build_connect_options(config: &NatsConfig) -> async_nats::ConnectOptions {
    let mut opts = async_nats::ConnectOptions::new()
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .request_timeout(Some(Duration::from_secs(config.request_timeout_secs)));

    if let Some(ref token) = config.token {
        opts = opts.token(token.clone());
    }

    opts
}

/// Ensure the JetStream stream exists with the correct configuration
async fn ensure_stream(
    js: &jetstream::Context,
    config: &NatsConfig,
) -> Result<jetstream::stream::Stream> {
    let storage = match config.storage {
        StorageType::File => jetstream::stream::StorageType::File,
        StorageType::Memory => jetstream::stream::StorageType::Memory,
    };

    let stream_config = jetstream::stream::Config {
        name: config.stream_name.clone(),
        subjects: config.stream_subjects(),
        storage,
        max_messages: config.max_messages,
        max_bytes: config.max_bytes,
        max_age: Duration::from_secs(config.max_age_secs),
        retention: jetstream::stream::RetentionPolicy::Limits,
        ..Default::default()
    };

    let stream = js
        .get_or_create_stream(stream_config)
        .await
        .map_err(|e| CalendarError::BackendUnavailable(format!(
            "Failed to create/get stream '{}': {}",
            config.stream_name, e
        )))?;

    tracing::info!(
        stream = %config.stream_name,
        subjects = ?config.stream_subjects(),
        "JetStream stream ready"
    );

    Ok(stream)
}
