use tokio_util::sync::CancellationToken;

use crate::channel;
use crate::config::CalendarConfig;
use crate::error::Result;
use crate::sender::NotificationSender;

/// Execute the `sender` command.
pub async fn execute(config: CalendarConfig, shutdown: CancellationToken) -> Result<()> {
    let channel = channel::connect(&config.channel).await?;
    NotificationSender::new(channel, config.sender.clone())
        .run(shutdown)
        .await
}
