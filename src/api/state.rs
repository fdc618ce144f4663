use std::sync::Arc;

use crate::channel::NotificationChannel;
use crate::storage::EventStore;

/// Shared application state accessible to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    /// Present when the process also publishes notifications
    pub channel: Option<Arc<dyn NotificationChannel>>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channel = Some(channel);
        self
    }
}
