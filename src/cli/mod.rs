pub mod scheduler;
pub mod sender;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_CONFIG_PATH;

/// A3S Calendar - Event storage, reminders, and notification delivery
#[derive(Debug, Parser)]
#[command(name = "a3s-calendar", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP API (and the scheduler when `scheduler.embedded` is set)
    Serve {
        /// Host address to bind to, overriding `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the notification scheduler
    Scheduler {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Consume notifications and publish delivery statuses
    Sender,
}

/// Token cancelled on SIGINT or SIGTERM.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
