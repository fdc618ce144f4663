//! In-memory event store
//!
//! A single `RwLock` guards the whole collection: reads share the lock,
//! writes take it exclusively.

use super::EventStore;
use crate::error::{CalendarError, Result};
use crate::types::Event;
use crate::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local event store for development, tests, and single-node use
pub struct MemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored events
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, event: &Event) -> Result<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(CalendarError::AlreadyExists(event.id));
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, event: &Event) -> Result<()> {
        let mut events = self.events.write().await;
        let slot = events.get_mut(&id).ok_or(CalendarError::NotFound(id))?;
        *slot = event.clone().with_id(id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut events = self.events.write().await;
        events.remove(&id).ok_or(CalendarError::NotFound(id))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Event> {
        let events = self.events.read().await;
        events.get(&id).cloned().ok_or(CalendarError::NotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        Ok(events.values().cloned().collect())
    }

    async fn list_in(&self, window: TimeWindow) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        let mut matched: Vec<Event> = events
            .values()
            .filter(|e| window.contains(e.start_time))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.start_time);
        Ok(matched)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|_, e| e.end_time >= cutoff);
        Ok((before - events.len()) as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
