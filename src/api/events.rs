use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::state::AppState;
use crate::error::{CalendarError, Result};
use crate::types::{timestamp, Event};

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: String,
}

fn body(payload: std::result::Result<Json<Event>, JsonRejection>) -> Result<Event> {
    payload
        .map(|Json(event)| event)
        .map_err(|e| CalendarError::Malformed(e.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(params)| params)
        .map_err(|e| CalendarError::Malformed(e.body_text()))
}

fn instant(raw: &str) -> Result<DateTime<Utc>> {
    timestamp::parse(raw)
        .ok_or_else(|| CalendarError::Malformed(format!("invalid timestamp: {raw}")))
}

/// GET /events - List every event.
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.store.list_all().await?))
}

/// POST /events - Create an event, generating an id when none is supplied.
pub async fn create_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Event>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = body(payload)?;
    state.store.create(&event).await?;
    tracing::info!(event_id = %event.id, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events/:id - Fetch one event.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>> {
    Ok(Json(state.store.get(id).await?))
}

/// PUT /events/:id - Replace an event; the path id wins over any id in the body.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: std::result::Result<Json<Event>, JsonRejection>,
) -> Result<Json<Event>> {
    let event = body(payload)?.with_id(id);
    state.store.update(id, &event).await?;
    tracing::info!(event_id = %id, "Event updated");
    Ok(Json(event))
}

/// DELETE /events/:id - Remove an event.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.delete(id).await?;
    tracing::info!(event_id = %id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /events/day?date= - Events starting within the UTC day of `date`.
pub async fn day_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<DayQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>> {
    let date = instant(&query(params)?.date)?;
    Ok(Json(state.store.list_by_day(date).await?))
}

/// GET /events/week?start= - Events starting within seven days after `start`.
pub async fn week_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>> {
    let start = instant(&query(params)?.start)?;
    Ok(Json(state.store.list_by_week(start).await?))
}

/// GET /events/month?start= - Events starting within one calendar month after `start`.
pub async fn month_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>> {
    let start = instant(&query(params)?.start)?;
    Ok(Json(state.store.list_by_month(start).await?))
}
