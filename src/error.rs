//! Error types for a3s-calendar

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the calendar system
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Event absent on update, delete, or get
    #[error("Event not found: {0}")]
    NotFound(Uuid),

    /// Duplicate create
    #[error("Event already exists: {0}")]
    AlreadyExists(Uuid),

    /// Storage or channel transport failure
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Input decode failure at the transport boundary
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// Publish failure
    #[error("Failed to publish to topic '{topic}': {reason}")]
    Publish {
        topic: String,
        reason: String,
    },

    /// Subscribe failure
    #[error("Failed to consume topic '{topic}': {reason}")]
    Subscribe {
        topic: String,
        reason: String,
    },

    /// Acknowledgement failure
    #[error("Failed to acknowledge message: {0}")]
    Ack(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl From<sqlx::Error> for CalendarError {
    fn from(err: sqlx::Error) -> Self {
        CalendarError::BackendUnavailable(err.to_string())
    }
}

/// Result type alias for calendar operations
pub type Result<T> = std::result::Result<T, CalendarError>;

impl axum::response::IntoResponse for CalendarError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            CalendarError::NotFound(_) => StatusCode::NOT_FOUND,
            CalendarError::AlreadyExists(_) => StatusCode::CONFLICT,
            CalendarError::Malformed(_) => StatusCode::BAD_REQUEST,
            CalendarError::BackendUnavailable(_)
            | CalendarError::Publish { .. }
            | CalendarError::Subscribe { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
