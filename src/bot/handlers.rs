use super::resilient::{ignore_blocked, send_message_resilient};
use crate::album::{AlbumOutcome, AlbumService, ChatContext};
use crate::i18n::Localizer;
use crate::storage::{MediaRef, SessionKey};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
    utils::command::BotCommands,
};
use tracing::info;

// Helper function to get user name from Message
fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Session and language for the sender of `msg`
#[must_use]
pub fn chat_context(msg: &Message, localizer: &Localizer) -> ChatContext {
    let locale = msg
        .from
        .as_ref()
        .and_then(|u| u.language_code.clone())
        .unwrap_or_else(|| localizer.default_language().to_string());
    ChatContext::new(SessionKey::new(get_user_id_safe(msg), msg.chat.id.0), locale)
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Explain how albums are made
    #[command(description = "How to use the bot.")]
    Help,
    /// Show settings
    #[command(description = "Settings.")]
    Settings,
}

/// Reply keyboard with the "done" and "clear" buttons in the user's language
///
/// # Examples
///
/// ```
/// use album_bot::bot::handlers::get_album_keyboard;
/// use album_bot::i18n::Localizer;
///
/// let keyboard = get_album_keyboard(&Localizer::builtin("en"), "en");
/// assert_eq!(keyboard.keyboard[0].len(), 2);
/// ```
#[must_use]
pub fn get_album_keyboard(localizer: &Localizer, locale: &str) -> KeyboardMarkup {
    let keyboard = vec![vec![
        KeyboardButton::new(localizer.t(locale, "keyboard_done", &[])),
        KeyboardButton::new(localizer.t(locale, "keyboard_clear", &[])),
    ]];
    KeyboardMarkup::new(keyboard).resize_keyboard()
}

/// Start handler
///
/// A user who blocked the bot is ignored silently.
///
/// # Errors
///
/// Returns an error if the greeting fails for any other reason.
pub async fn start(bot: Bot, msg: Message, localizer: Arc<Localizer>) -> Result<()> {
    let ctx = chat_context(&msg, &localizer);
    let user_name = get_user_name(&msg);

    info!("User {} ({user_name}) initiated /start command.", ctx.key.user_id);

    let greeting = localizer.t(&ctx.locale, "greeting", &[("username", &user_name)]);
    let keyboard = get_album_keyboard(&localizer, &ctx.locale);
    ignore_blocked(send_message_resilient(&bot, msg.chat.id, greeting, Some(keyboard)).await)?;
    Ok(())
}

/// Help handler
///
/// # Errors
///
/// Returns an error if the message cannot be sent.
pub async fn help(bot: Bot, msg: Message, localizer: Arc<Localizer>) -> Result<()> {
    let ctx = chat_context(&msg, &localizer);
    let text = localizer.t(&ctx.locale, "help", &[]);
    send_message_resilient(&bot, msg.chat.id, text, None).await?;
    Ok(())
}

/// Settings handler
///
/// # Errors
///
/// Returns an error if the message cannot be sent.
pub async fn settings(bot: Bot, msg: Message, localizer: Arc<Localizer>) -> Result<()> {
    let ctx = chat_context(&msg, &localizer);
    let text = localizer.t(&ctx.locale, "settings", &[]);
    send_message_resilient(&bot, msg.chat.id, text, None).await?;
    Ok(())
}

/// Media carried by `msg`: the largest size of a photo, or a video
#[must_use]
pub fn media_of(msg: &Message) -> Option<MediaRef> {
    if let Some(sizes) = msg.photo() {
        return sizes.last().map(|p| MediaRef::photo(p.file.id.0.clone()));
    }
    msg.video().map(|v| MediaRef::video(v.file.id.0.clone()))
}

/// Photo and video handler: queue the media for the next album
///
/// # Errors
///
/// Returns an error if the session cannot be updated.
pub async fn handle_media(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<()> {
    let Some(media) = media_of(&msg) else {
        return Ok(());
    };
    let ctx = chat_context(&msg, &localizer);
    service.on_media(ctx, media).await?;
    Ok(())
}

/// "Done" keyword handler: post the album right away
///
/// # Errors
///
/// Returns an error if the session cannot be updated.
pub async fn handle_done(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<()> {
    let ctx = chat_context(&msg, &localizer);
    let outcome = service.done(&ctx).await?;
    if let AlbumOutcome::DispatchFailed {
        sent_pages,
        total_pages,
    } = outcome
    {
        info!(
            "Album for {} stopped after {sent_pages}/{total_pages} media groups",
            ctx.key
        );
    }
    Ok(())
}

/// "Clear" keyword handler: forget the queued media
///
/// # Errors
///
/// Returns an error if the session cannot be updated.
pub async fn handle_clear(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<()> {
    let ctx = chat_context(&msg, &localizer);
    info!("User {} cleared the media queue.", ctx.key.user_id);
    service.clear(&ctx).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert!(matches!(
            Command::parse("/start", "album_bot"),
            Ok(Command::Start)
        ));
        assert!(matches!(
            Command::parse("/settings", "album_bot"),
            Ok(Command::Settings)
        ));
        assert!(Command::parse("/stats", "album_bot").is_err());
    }

    #[test]
    fn test_keyboard_is_localized() {
        let i18n = Localizer::builtin("en");
        let keyboard = get_album_keyboard(&i18n, "ru");
        let labels: Vec<&str> = keyboard.keyboard[0]
            .iter()
            .map(|button| button.text.as_str())
            .collect();
        assert_eq!(labels, vec!["Готово", "Очистить"]);
    }
}
