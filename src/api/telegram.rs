//! Implements the `Chat` trait with a Telegram bot using long polling.

use crate::api::{Chat, Reply};
use crate::Result;
use anyhow::Context;
use std::collections::VecDeque;
use teloxide::payloads::{GetUpdatesSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters, Update, UpdateKind};
use tracing::{debug, trace, warn};

/// Seconds Telegram holds a `getUpdates` call open waiting for a message. This must stay below the
/// HTTP timeout of teloxide's default client.
const POLL_TIMEOUT_SECS: u32 = 10;

/// Talks to a single Telegram chat. Messages from any other chat are ignored.
pub(super) struct TelegramChat {
    bot: Bot,
    chat_id: ChatId,
    /// The `getUpdates` offset, one past the last update we have seen.
    offset: i32,
    /// Messages received in the same poll as an earlier one, waiting to be handed out.
    buffered: VecDeque<Reply>,
}

impl TelegramChat {
    /// Creates the bot and drops any updates that were queued before this program started, so
    /// that old messages are not taken as answers to new questions.
    pub(super) async fn connect(token: &str, chat_id: i64) -> Result<Self> {
        Self::with_bot(Bot::new(token), chat_id).await
    }

    async fn with_bot(bot: Bot, chat_id: i64) -> Result<Self> {
        let mut chat = Self {
            bot,
            chat_id: ChatId(chat_id),
            offset: 0,
            buffered: VecDeque::new(),
        };
        chat.skip_pending().await?;
        Ok(chat)
    }

    async fn skip_pending(&mut self) -> Result<()> {
        // A negative offset returns only the newest update and forgets everything before it.
        let updates = self
            .bot
            .get_updates()
            .offset(-1)
            .timeout(0)
            .await
            .context("Failed to connect to Telegram")?;
        let (offset, stale) = accept_updates(self.chat_id, updates);
        if let Some(offset) = offset {
            self.offset = offset;
            debug!(
                "Skipped Telegram updates queued before startup, {} from this chat",
                stale.len()
            );
        }
        Ok(())
    }
}

/// Picks the text messages sent in `chat_id` out of a batch of updates, in the order they arrived.
/// Also returns the offset that acknowledges the whole batch, `None` when it is empty.
fn accept_updates(chat_id: ChatId, updates: Vec<Update>) -> (Option<i32>, Vec<Reply>) {
    let offset = updates.last().map(|update| update.id.as_offset());
    let mut replies = Vec::new();
    for update in updates {
        let UpdateKind::Message(message) = update.kind else {
            trace!("Ignoring a Telegram update that is not a message");
            continue;
        };
        if message.chat.id != chat_id {
            warn!("Ignoring a message from chat {}", message.chat.id);
            continue;
        }
        match message.text() {
            Some(text) => replies.push(Reply {
                text: text.to_string(),
                message_id: Some(message.id.0),
            }),
            None => debug!("Ignoring a Telegram message without text"),
        }
    }
    (offset, replies)
}

#[async_trait::async_trait]
impl Chat for TelegramChat {
    async fn send(&mut self, text: &str) -> Result<()> {
        trace!("Sending Telegram message: {text}");
        self.bot
            .send_message(self.chat_id, text)
            .await
            .context("Failed to send a Telegram message")?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply> {
        loop {
            if let Some(reply) = self.buffered.pop_front() {
                return Ok(reply);
            }

            let updates = self
                .bot
                .get_updates()
                .offset(self.offset)
                .timeout(POLL_TIMEOUT_SECS)
                .await
                .context("Failed to poll Telegram for messages")?;

            let (offset, replies) = accept_updates(self.chat_id, updates);
            if let Some(offset) = offset {
                self.offset = offset;
            }
            self.buffered.extend(replies);
        }
    }

    async fn reply(&mut self, to: &Reply, text: &str) -> Result<()> {
        let Some(message_id) = to.message_id else {
            return self.send(text).await;
        };
        self.bot
            .send_message(self.chat_id, text)
            .reply_parameters(ReplyParameters::new(MessageId(message_id)))
            .await
            .context("Failed to reply to a Telegram message")?;
        Ok(())
    }
}
