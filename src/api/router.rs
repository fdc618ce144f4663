use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{events, health};

/// Build the complete axum Router with all API routes.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route(
            "/events",
            get(events::list_handler).post(events::create_handler),
        )
        .route("/events/day", get(events::day_handler))
        .route("/events/week", get(events::week_handler))
        .route("/events/month", get(events::month_handler))
        .route(
            "/events/:id",
            get(events::get_handler)
                .put(events::update_handler)
                .delete(events::delete_handler),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
