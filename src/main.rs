use clap::Parser;

use a3s_calendar::cli::{self, Cli, Commands};
use a3s_calendar::config::CalendarConfig;
use a3s_calendar::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CalendarConfig::load(&cli.config)?;
    logging::init(&config.logger);
    tracing::debug!(path = %cli.config.display(), "Loaded configuration");

    let shutdown = cli::shutdown_token();

    match cli.command {
        Commands::Serve { host, port } => {
            cli::serve::execute(config, host, port, shutdown).await?;
        }
        Commands::Scheduler { once } => {
            cli::scheduler::execute(config, once, shutdown).await?;
        }
        Commands::Sender => {
            cli::sender::execute(config, shutdown).await?;
        }
    }

    Ok(())
}
