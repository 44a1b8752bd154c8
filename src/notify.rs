// src/notify.rs
use crate::menu::{Format, Screen};
use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode};
use teloxide::Bot;

/// Outbound messages for one user interaction
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Replace the message the interaction came from
    async fn edit_current_message(&self, screen: &Screen) -> Result<()>;
    async fn send_message(&self, target_user_id: i64, screen: &Screen) -> Result<()>;
}

/// Bound to the chat (and, for button presses, the message) that triggered the update
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: ChatId, message_id: Option<MessageId>) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Without an originating message a fresh one is sent instead
    async fn edit_current_message(&self, screen: &Screen) -> Result<()> {
        let Some(message_id) = self.message_id else {
            return self.send_message(self.chat_id.0, screen).await;
        };
        let mut req = self
            .bot
            .edit_message_text(self.chat_id, message_id, screen.text.clone());
        if !screen.keyboard.is_empty() {
            req = req.reply_markup(screen.keyboard.to_markup());
        }
        if screen.format == Format::MarkdownV2 {
            req = req.parse_mode(ParseMode::MarkdownV2);
        }
        req.await?;
        Ok(())
    }

    async fn send_message(&self, target_user_id: i64, screen: &Screen) -> Result<()> {
        let mut req = self
            .bot
            .send_message(ChatId(target_user_id), screen.text.clone());
        if !screen.keyboard.is_empty() {
            req = req.reply_markup(screen.keyboard.to_markup());
        }
        if screen.format == Format::MarkdownV2 {
            req = req.parse_mode(ParseMode::MarkdownV2);
        }
        req.await?;
        Ok(())
    }
}
