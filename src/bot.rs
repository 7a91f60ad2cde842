//! Main bot loop: pulls messages from every channel and hands them to the dispatcher.

use std::sync::Arc;

use futures::StreamExt;

use crate::channels::ChannelManager;
use crate::config::BotConfig;
use crate::conversation::{ConversationHandler, Dispatcher};
use crate::error::Error;

pub struct HoneyPathBot {
    config: BotConfig,
    handler: Arc<ConversationHandler>,
    channels: Arc<ChannelManager>,
}

impl HoneyPathBot {
    pub fn new(
        config: BotConfig,
        handler: Arc<ConversationHandler>,
        channels: ChannelManager,
    ) -> Self {
        Self {
            config,
            handler,
            channels: Arc::new(channels),
        }
    }

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// Messages already queued when the loop stops are still answered
    /// before the channels are shut down.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;
        let mut dispatcher = Dispatcher::new(
            Arc::clone(&self.handler),
            Arc::clone(&self.channels),
            self.config.worker_idle_timeout,
        );

        tracing::info!(
            channels = ?self.channels.names(),
            "Bot {} ready and listening",
            self.config.name
        );

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            tracing::debug!(
                user_id = %message.user_id,
                channel = %message.channel,
                "Message received"
            );
            dispatcher.dispatch(message);
        }

        tracing::info!("Bot shutting down...");
        dispatcher.shutdown().await;
        self.channels.shutdown_all().await;

        Ok(())
    }
}
