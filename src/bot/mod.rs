/// Command and message handlers
pub mod handlers;
/// Telegram sends with retry on transient failures
pub mod resilient;
/// Telegram runtime entrypoint
pub mod runner;
/// Bot API implementation of the album transport
pub mod transport;

pub use transport::TelegramTransport;
