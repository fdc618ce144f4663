//! REST transport over the event store

pub mod events;
pub mod health;
pub mod router;
pub mod state;

pub use state::AppState;

use tokio_util::sync::CancellationToken;

use crate::error::{CalendarError, Result};

/// Serve the API on `bind_addr` until `shutdown` is cancelled.
pub async fn serve(bind_addr: &str, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| CalendarError::Config(format!("Failed to bind to {bind_addr}: {e}")))?;

    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
