use tokio_util::sync::CancellationToken;

use crate::channel;
use crate::config::CalendarConfig;
use crate::error::Result;
use crate::scheduler::NotificationScheduler;
use crate::storage;

/// Execute the `scheduler` command.
pub async fn execute(
    config: CalendarConfig,
    once: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    let store = storage::open(&config.database).await?;
    let channel = channel::connect(&config.channel).await?;
    let scheduler = NotificationScheduler::new(store, channel.clone(), config.scheduler.clone());

    if once {
        channel.declare(&config.scheduler.topic).await?;
        let report = scheduler.run_cycle().await;
        println!(
            "scanned {} events, notified {}, failed {}, pruned {}",
            report.scanned,
            report.notified,
            report.failed,
            report
                .pruned
                .map_or_else(|| "-".to_string(), |n| n.to_string())
        );
        return Ok(());
    }

    scheduler.run(shutdown).await
}
