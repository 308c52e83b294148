//! Quiz Bot - AI-generated quizzes over Telegram
//!
//! Users pick a topic, answer generated multiple-choice questions, and get
//! the next question automatically after a short pause.

mod config;
mod llm;
mod quiz;
mod runtime;
mod state_machine;
mod store;
mod transport;

use config::Config;
use llm::{GeminiService, LlmService, LoggingService};
use quiz::QuizGenerator;
use runtime::{ProductionManager, RuntimeSettings, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use store::InMemorySessionStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::TelegramOutbox;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(config = ?config, "Configuration loaded");

    // Generation backend
    let gemini = GeminiService::new(
        config.gemini_api_key.clone(),
        &config.gemini_model,
        config.generation_timeout,
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(gemini));
    let generator = QuizGenerator::new(llm, config.generation_timeout);

    // Chat transport; the HTTP timeout must outlast the long-poll timeout
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let bot = teloxide::Bot::with_client(&config.telegram_token, client);

    let settings = RuntimeSettings {
        advance_delay: config.advance_delay,
        ..RuntimeSettings::default()
    };
    let manager: Arc<ProductionManager> = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(generator),
        Arc::new(TelegramOutbox::new(bot.clone())),
        settings,
    ));

    tracing::info!(
        model = %config.gemini_model,
        advance_delay_secs = config.advance_delay.as_secs(),
        "Quiz bot started"
    );
    transport::run(bot, manager).await;

    Ok(())
}
