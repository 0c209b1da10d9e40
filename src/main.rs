use anyhow::Context;
use tracing_subscriber::prelude::*;

use peb::bot::Bot;
use peb::config::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    let config = BotConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing; the guard flushes the file log on exit.
    let (file_layer, _log_guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "peb.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    eprintln!("🤖 Prompt Enhancer Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);

    let bot = Bot::from_config(&config)?;

    if let Some(ref telegram) = config.telegram {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            telegram.allowed_users.join(", ")
        );
    }
    if config.cli {
        eprintln!("   CLI: enabled. /start to begin, Ctrl+C to exit.\n");
    }

    bot.run().await?;

    Ok(())
}
