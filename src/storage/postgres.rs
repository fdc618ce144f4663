//! Postgres event store
//!
//! Each operation is a single statement; atomicity comes from the
//! database's own transaction isolation. Compound sequences (e.g. create
//! then update) are not atomic at this layer.

use super::{DatabaseConfig, EventStore};
use crate::error::{CalendarError, Result};
use crate::types::Event;
use crate::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, start_time, end_time, user_id FROM events";

/// Postgres-backed event store
pub struct PgEventStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    user_id: Uuid,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            user_id: row.user_id,
        }
    }
}

impl PgEventStore {
    /// Connect, retrying the initial handshake, and ensure the schema exists
    ///
    /// Steady-state query failures are never retried; they surface as
    /// `BackendUnavailable`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        let pool = connect_with_retry(
            config.connect_attempts,
            Duration::from_secs(config.connect_backoff_secs),
            || options.clone().connect(&config.dsn),
        )
        .await?;

        tracing::info!("Connected to Postgres");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `events` table and its indexes if absent
    pub async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                start_time TIMESTAMPTZ NOT NULL,
                end_time TIMESTAMPTZ NOT NULL,
                user_id UUID NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_failed("events", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time)")
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed("idx_events_start_time", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_end_time ON events(end_time)")
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed("idx_events_end_time", e))?;

        tx.commit().await?;
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, start_time, end_time, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                CalendarError::AlreadyExists(event.id)
            }
            other => other.into(),
        })?;

        Ok(())
    }

    async fn update(&self, id: Uuid, event: &Event) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                title = $1, description = $2, start_time = $3, end_time = $4, user_id = $5
            WHERE id = $6
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CalendarError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CalendarError::NotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Event> {
        let row: EventRow = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CalendarError::NotFound(id))?;

        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(SELECT_COLUMNS)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_in(&self, window: TimeWindow) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE start_time > $1 AND start_time < $2 ORDER BY start_time"
        ))
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM events WHERE end_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

fn migration_failed(step: &str, err: sqlx::Error) -> CalendarError {
    CalendarError::BackendUnavailable(format!("Migration failed ({}): {}", step, err))
}

/// Run `connect` up to `attempts` times with a fixed `backoff` between tries
pub(crate) async fn connect_with_retry<T, F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut connect: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match connect().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Failed to connect to database"
                );
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
        }
    }

    Err(CalendarError::BackendUnavailable(format!(
        "Giving up after {} connection attempts: {}",
        attempts, last_error
    )))
}
