//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Text messages are retried on transient network failures using exponential
//! backoff with jitter. Media groups are never retried here: a retry after a
//! timeout could post the same album twice.

use crate::album::TransportError;
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardMarkup, Message};
use teloxide::{ApiError, RequestError};
use tracing::debug;

/// Whether a failed request is worth retrying
#[must_use]
pub fn is_transient(error: &RequestError) -> bool {
    matches!(error, RequestError::Network(_) | RequestError::Io(_))
}

/// Map a teloxide error onto the transport error taxonomy
#[must_use]
pub fn classify(error: &RequestError) -> TransportError {
    match error {
        RequestError::Api(
            ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::BotKicked,
        ) => TransportError::Blocked(error.to_string()),
        _ => TransportError::Request(error.to_string()),
    }
}

/// Drop the error of a send whose recipient blocked the bot or is gone.
///
/// Any other error is passed on unchanged.
///
/// # Errors
///
/// Returns `result`'s error unless it means the recipient is unavailable.
pub fn ignore_blocked<T>(result: Result<T, RequestError>) -> Result<(), RequestError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => match classify(&e) {
            TransportError::Blocked(reason) => {
                debug!("Recipient unavailable, message dropped: {reason}");
                Ok(())
            }
            TransportError::Request(_) => Err(e),
        },
    }
}

/// Send a message with automatic retry on network failures.
///
/// # Arguments
///
/// * `bot` - The Telegram bot instance
/// * `chat_id` - Target chat ID
/// * `text` - Message text to send
/// * `keyboard` - Optional reply keyboard to attach
///
/// # Errors
///
/// Returns the last error after all retries are exhausted, or the first
/// non-transient error.
///
/// # Examples
///
/// ```ignore
/// let msg = send_message_resilient(&bot, chat_id, "Queue cleared.", None).await?;
/// ```
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<KeyboardMarkup>,
) -> Result<Message, RequestError> {
    let text = text.into();
    crate::utils::retry_telegram_operation(
        || async {
            let mut req = bot.send_message(chat_id, text.clone());
            if let Some(markup) = keyboard.clone() {
                req = req.reply_markup(markup);
            }
            req.await
        },
        is_transient,
    )
    .await
}
