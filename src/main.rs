use std::sync::Arc;

use anyhow::Context;

use honeypath::bot::HoneyPathBot;
use honeypath::channels::{ChannelManager, CliChannel, TelegramChannel};
use honeypath::config::BotConfig;
use honeypath::conversation::ConversationHandler;
use honeypath::quiz::{QuizDefinition, QuizEngine, bear_type_quiz};
use honeypath::session::SessionStore;
use honeypath::store::open_recorder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; real environment variables win.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env()?;

    // ── Quiz ─────────────────────────────────────────────────────────────
    let definition = match &config.quiz_file {
        Some(path) => QuizDefinition::from_json_file(path)?,
        None => bear_type_quiz(),
    };
    let engine = Arc::new(QuizEngine::new(definition).context("invalid quiz definition")?);

    // ── Storage ──────────────────────────────────────────────────────────
    let recorder = open_recorder(&config.store).await.with_context(|| {
        format!(
            "failed to open results store at {}",
            config.store.path.display()
        )
    })?;

    eprintln!("🐻 HoneyPath v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Quiz: {} questions", engine.question_count());
    eprintln!(
        "   Store: {} ({})",
        config.store.path.display(),
        recorder.name()
    );

    // ── Channels ─────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();

    if let Some(token) = &config.telegram_token {
        channels.add(Box::new(TelegramChannel::new(token.clone())));
        eprintln!("   Telegram: enabled");
    }

    if config.cli_enabled {
        channels.add(Box::new(CliChannel::new()));
        eprintln!("   CLI: type /start and press Enter.\n");
    }

    if channels.names().is_empty() {
        anyhow::bail!("no channel configured: set TELEGRAM_BOT_TOKEN or HONEYPATH_CLI=true");
    }

    let sessions = Arc::new(SessionStore::new(Arc::clone(&engine)));
    let handler = Arc::new(ConversationHandler::new(engine, sessions, recorder));

    let bot = HoneyPathBot::new(config, handler, channels);
    bot.run().await?;

    Ok(())
}
