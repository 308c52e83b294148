//! Telegram binding over teloxide

use super::{decode_callback, decode_text, OutgoingMessage};
use crate::runtime::{ChatOutbox, ProductionManager};
use crate::state_machine::{ChatId, Event, MessageRef, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};

/// Outbound adapter sending rendered replies through the Bot API
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(message: &OutgoingMessage) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = message
        .controls
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(&c.label, &c.payload)])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl ChatOutbox for TelegramOutbox {
    async fn send_message(&self, chat: ChatId, message: &OutgoingMessage) -> Result<(), String> {
        let mut request = self
            .bot
            .send_message(teloxide::types::ChatId(chat.0), &message.text)
            .parse_mode(ParseMode::Html);

        if !message.controls.is_empty() {
            request = request.reply_markup(keyboard(message));
        }

        request.await.map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), String> {
        self.bot
            .edit_message_text(teloxide::types::ChatId(chat.0), MessageId(message.0), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// Long-poll Telegram and feed every update into the session manager.
///
/// Returns when the dispatcher shuts down (Ctrl-C).
pub async fn run(bot: Bot, manager: Arc<ProductionManager>) {
    let message_handler = Update::filter_message().endpoint({
        let manager = manager.clone();
        move |msg: Message| {
            let manager = manager.clone();
            async move {
                if let Err(e) = handle_message(&msg, &manager).await {
                    tracing::warn!(error = %e, "Failed to handle message");
                }
                respond(())
            }
        }
    });

    let callback_handler = Update::filter_callback_query().endpoint({
        let manager = manager.clone();
        move |bot: Bot, query: CallbackQuery| {
            let manager = manager.clone();
            async move {
                if let Err(e) = handle_callback_query(&query, &manager).await {
                    tracing::warn!(error = %e, "Failed to handle callback query");
                }
                // Always clear the client's loading indicator
                if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                    tracing::debug!(error = %e, "Failed to answer callback query");
                }
                respond(())
            }
        }
    });

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    tracing::info!("Telegram transport starting");

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Telegram transport stopped");
}

async fn handle_message(msg: &Message, manager: &ProductionManager) -> Result<(), String> {
    let Some(text) = msg.text() else {
        tracing::debug!("Ignoring message without text");
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        tracing::debug!("Ignoring message without sender");
        return Ok(());
    };
    let Some(event) = decode_text(text) else {
        return Ok(());
    };

    dispatch(manager, UserId(user.id.0), ChatId(msg.chat.id.0), event, None).await
}

async fn handle_callback_query(
    query: &CallbackQuery,
    manager: &ProductionManager,
) -> Result<(), String> {
    let Some(data) = query.data.as_deref() else {
        tracing::debug!("Ignoring callback query without data");
        return Ok(());
    };
    let Some(message) = &query.message else {
        tracing::debug!("Ignoring callback query without message");
        return Ok(());
    };
    let Some(event) = decode_callback(data) else {
        return Ok(());
    };

    dispatch(
        manager,
        UserId(query.from.id.0),
        ChatId(message.chat().id.0),
        event,
        Some(MessageRef(message.id().0)),
    )
    .await
}

async fn dispatch(
    manager: &ProductionManager,
    user: UserId,
    chat: ChatId,
    event: Event,
    origin: Option<MessageRef>,
) -> Result<(), String> {
    tracing::debug!(user_id = %user, event = event.name(), "Inbound event");
    manager.dispatch(user, chat, event, origin).await
}
