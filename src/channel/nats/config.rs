//! NATS JetStream channel configuration

use serde::{Deserialize, Serialize};

/// JetStream storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Persisted to disk; survives server restarts
    #[default]
    File,
    /// Held in server memory
    Memory,
}

/// Connection and stream settings for the NATS channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URL
    #[serde(default = "default_url")]
    pub url: String,

    /// JetStream stream holding every topic
    #[serde(default = "default_stream_name")]
    pub stream_name: String,

    /// Topics map to subjects `<subject_prefix>.<topic>`
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    #[serde(default)]
    pub storage: StorageType,

    /// Maximum messages retained by the stream (-1 = unlimited)
    #[serde(default = "default_unlimited")]
    pub max_messages: i64,

    /// Maximum bytes retained by the stream (-1 = unlimited)
    #[serde(default = "default_unlimited")]
    pub max_bytes: i64,

    /// Message age limit in seconds (0 = unlimited)
    #[serde(default)]
    pub max_age_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional auth token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_stream_name() -> String {
    "CALENDAR".to_string()
}

fn default_subject_prefix() -> String {
    "calendar".to_string()
}

fn default_unlimited() -> i64 {
    -1
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            stream_name: default_stream_name(),
            subject_prefix: default_subject_prefix(),
            storage: StorageType::default(),
            max_messages: default_unlimited(),
            max_bytes: default_unlimited(),
            max_age_secs: 0,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
        }
    }
}

impl NatsConfig {
    /// Subject a topic is published to
    pub fn topic_subject(&self, topic: &str) -> String {
        format!("{}.{}", self.subject_prefix, topic)
    }

    /// Subjects captured by the stream
    pub fn stream_subjects(&self) -> Vec<String> {
        vec![format!("{}.>", self.subject_prefix)]
    }

    /// Durable consumer name for a topic
    pub fn consumer_name(&self, topic: &str) -> String {
        format!("{}-{}", self.subject_prefix, topic).replace('.', "-")
    }

    /// Recover the topic from a full subject
    pub fn topic_of<'a>(&self, subject: &'a str) -> &'a str {
        subject
            .strip_prefix(self.subject_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(subject)
    }
}
