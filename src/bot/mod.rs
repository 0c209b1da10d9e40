//! Bot: wires channels to per-user conversation sessions.

pub mod session;
pub mod sessions;

pub use session::respond_to;
pub use sessions::SessionRouter;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::channels::{ChannelManager, CliChannel, TelegramChannel};
use crate::config::BotConfig;
use crate::error::{ConfigError, Error};
use crate::llm::{PromptService, create_service};

/// The bot's main loop.
pub struct Bot {
    name: String,
    service: Arc<dyn PromptService>,
    channels: Arc<ChannelManager>,
    session_idle_timeout: Duration,
}

impl Bot {
    pub fn new(
        name: &str,
        service: Arc<dyn PromptService>,
        channels: ChannelManager,
        session_idle_timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            service,
            channels: Arc::new(channels),
            session_idle_timeout,
        }
    }

    /// Build the bot from configuration: the OpenAI service plus every
    /// enabled channel. At least one channel must be enabled.
    pub fn from_config(config: &BotConfig) -> Result<Self, Error> {
        let service = create_service(&config.llm)?;

        let mut channels = ChannelManager::new();
        if let Some(ref telegram) = config.telegram {
            channels.add(Box::new(TelegramChannel::new(
                telegram.bot_token.clone(),
                telegram.allowed_users.clone(),
            )));
        }
        if config.cli {
            channels.add(Box::new(CliChannel::new()));
        }
        if channels.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "PEB_CLI".to_string(),
                message: "no channel enabled; set TELEGRAM_BOT_TOKEN or PEB_CLI=true".to_string(),
            }
            .into());
        }

        Ok(Self::new(
            &config.name,
            service,
            channels,
            config.session_idle_timeout,
        ))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.names()
    }

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// Events already queued for a session are still answered before this
    /// returns.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;
        let mut router = SessionRouter::new(
            Arc::clone(&self.service),
            Arc::clone(&self.channels),
            self.session_idle_timeout,
        );

        tracing::info!(
            "Bot {} ready on {} (model: {})",
            self.name,
            self.channels.names().join(", "),
            self.service.model_name()
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

            router.dispatch(message);
        }

        // Cleanup
        tracing::info!("Bot shutting down...");
        router.shutdown().await;
        self.channels.shutdown_all().await?;

        Ok(())
    }
}
