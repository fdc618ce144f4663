use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::state::AppState;

/// GET /health - Liveness plus backend readiness.
pub async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    let channel = match &state.channel {
        Some(channel) => {
            let ok = channel.health().await.unwrap_or_else(|e| {
                tracing::warn!(channel = channel.name(), error = %e, "Channel health check failed");
                false
            });
            Some((channel.name().to_string(), ok))
        }
        None => None,
    };

    let healthy = channel.as_ref().map_or(true, |(_, ok)| *ok);
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "store": state.store.name(),
        "channel": channel.map(|(name, _)| name),
    });
    (status, Json(body))
}
