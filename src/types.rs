//! Core calendar types
//!
//! All types use camelCase JSON serialization for wire compatibility.
//! The same `Event` shape is used by the REST transport and queue payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar event
///
/// The store treats `start_time` and `end_time` as opaque timestamps used only
/// for comparison; `start_time <= end_time` is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier, immutable after creation (generated when absent on the wire)
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Accepts epoch seconds or RFC3339 on input; serialized as RFC3339
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,

    /// Owner identifier
    pub user_id: Uuid,
}

impl Event {
    /// Create a new event with an auto-generated id
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        user_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            start_time,
            end_time,
            user_id,
        }
    }

    /// Replace the identifier
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

/// Reminder produced by the scheduler for an event inside the lookahead horizon
///
/// Derived and ephemeral: never persisted, no deduplication across passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub event_id: Uuid,

    pub title: String,

    /// Event start as Unix epoch seconds
    pub start_time: i64,
}

impl Notification {
    pub fn for_event(event: &Event) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            start_time: event.start_time.timestamp(),
        }
    }
}

/// Status reported by the downstream consumer after handling a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatus {
    pub event_id: Uuid,
    pub status: String,
    pub details: String,
}

impl NotificationStatus {
    pub fn processed(event_id: Uuid) -> Self {
        Self {
            event_id,
            status: "processed".to_string(),
            details: "Notification processed successfully".to_string(),
        }
    }
}

/// Serde codec for wire timestamps
///
/// Deserializes from epoch seconds (JSON number or digit string) or an
/// RFC3339 string. Serializes to RFC3339.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TimestampVisitor)
    }

    /// Parse epoch seconds or RFC3339
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(secs) = raw.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    struct TimestampVisitor;

    impl<'de> Visitor<'de> for TimestampVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("epoch seconds or an RFC3339 timestamp")
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Self::Value, E> {
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| E::custom(format!("timestamp out of range: {secs}")))
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Self::Value, E> {
            let secs = i64::try_from(secs)
                .map_err(|_| E::custom(format!("timestamp out of range: {secs}")))?;
            self.visit_i64(secs)
        }

        fn visit_str<E: de::Error>(self, raw: &str) -> Result<Self::Value, E> {
            parse(raw).ok_or_else(|| E::custom(format!("invalid timestamp: {raw}")))
        }
    }
}
