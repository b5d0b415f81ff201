use crate::storage::MediaRef;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by outbound sends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The user blocked the bot or the account is gone
    #[error("recipient unavailable: {0}")]
    Blocked(String),
    /// Any other failure (network, rate limit, rejected request)
    #[error("request failed: {0}")]
    Request(String),
}

/// Outbound side of the messaging platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Send a plain text message
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), TransportError>;
    /// Send `media` as a single media group, keeping its order
    async fn send_media_group(
        &self,
        chat_id: i64,
        media: Vec<MediaRef>,
    ) -> Result<(), TransportError>;
}
