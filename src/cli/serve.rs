use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{self, AppState};
use crate::channel;
use crate::config::CalendarConfig;
use crate::error::Result;
use crate::scheduler::NotificationScheduler;
use crate::storage;

/// Execute the `serve` command: start the HTTP API.
pub async fn execute(
    mut config: CalendarConfig,
    host: Option<String>,
    port: Option<u16>,
    shutdown: CancellationToken,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let store = storage::open(&config.database).await?;
    let mut state = AppState::new(store.clone());

    let scheduler = if config.scheduler.embedded {
        let channel = channel::connect(&config.channel).await?;
        state = state.with_channel(channel.clone());

        let scheduler = NotificationScheduler::new(store, channel, config.scheduler.clone());
        Some(spawn_scheduler(scheduler, shutdown.clone()))
    } else {
        None
    };

    let served = api::serve(&config.server.bind_address(), state, shutdown.clone()).await;
    shutdown.cancel();

    if let Some(handle) = scheduler {
        match handle.await {
            Ok(result) => result?,
            Err(e) => tracing::error!(error = %e, "Scheduler task panicked"),
        }
    }

    served
}

/// Run the scheduler alongside the server, logging a failure as soon as it happens
fn spawn_scheduler(
    scheduler: NotificationScheduler,
    shutdown: CancellationToken,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let result = scheduler.run(shutdown).await;
        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                "Embedded scheduler stopped; notifications are not being sent"
            );
        }
        result
    })
}
