//! Telegram implementation of the album transport.

use super::resilient::{classify, send_message_resilient};
use crate::album::{MediaTransport, TransportError};
use crate::storage::{MediaKind, MediaRef};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, InputMedia, InputMediaPhoto, InputMediaVideo};

/// Sends album notices and media groups through the Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap `bot`
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Bot API input media for an already uploaded file
#[must_use]
pub fn to_input_media(media: MediaRef) -> InputMedia {
    let file = InputFile::file_id(FileId(media.id));
    match media.kind {
        MediaKind::Photo => InputMedia::Photo(InputMediaPhoto::new(file)),
        MediaKind::Video => InputMedia::Video(InputMediaVideo::new(file)),
    }
}

#[async_trait]
impl MediaTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), TransportError> {
        send_message_resilient(&self.bot, ChatId(chat_id), text, None)
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }

    async fn send_media_group(
        &self,
        chat_id: i64,
        media: Vec<MediaRef>,
    ) -> Result<(), TransportError> {
        let media: Vec<InputMedia> = media.into_iter().map(to_input_media).collect();
        self.bot
            .send_media_group(ChatId(chat_id), media)
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kinds_map_to_input_media() {
        assert!(matches!(
            to_input_media(MediaRef::photo("p")),
            InputMedia::Photo(_)
        ));
        assert!(matches!(
            to_input_media(MediaRef::video("v")),
            InputMedia::Video(_)
        ));
    }
}
