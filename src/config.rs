//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the album and Telegram API constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram rejects media groups with more items than this.
pub const MEDIA_GROUP_LIMIT: usize = 10;

/// Quiet period before a burst of media is turned into an album
pub const DEFAULT_ALBUM_DEBOUNCE_MS: u64 = 500;

/// Queues shorter than this are answered with "not enough media"
pub const DEFAULT_ALBUM_MIN_ITEMS: usize = 1;

/// Maximum retries for a Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff between Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the backoff between Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,

    /// Port for the landing page. The page is not served when unset.
    pub port: Option<u16>,

    /// Path of the JSON file holding user sessions
    #[serde(default = "default_session_db")]
    pub session_db: String,

    /// Directory with `<lang>.yaml` locale tables
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,

    /// Language used when the user's language has no table
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Directory served by the landing page
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Debounce delay in milliseconds
    #[serde(default = "default_album_debounce_ms")]
    pub album_debounce_ms: u64,

    /// Maximum items per posted media group
    #[serde(default = "default_album_max_page_size")]
    pub album_max_page_size: usize,

    /// Minimum queued items needed to post an album
    #[serde(default = "default_album_min_items")]
    pub album_min_items: usize,
}

fn default_session_db() -> String {
    "sessions.json".to_string()
}

fn default_locales_dir() -> String {
    "locales".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

const fn default_album_debounce_ms() -> u64 {
    DEFAULT_ALBUM_DEBOUNCE_MS
}

const fn default_album_max_page_size() -> usize {
    MEDIA_GROUP_LIMIT
}

const fn default_album_min_items() -> usize {
    DEFAULT_ALBUM_MIN_ITEMS
}

/// Album pipeline tuning derived from [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumSettings {
    /// Quiet period before finalization
    pub debounce: Duration,
    /// Maximum items per page, within `1..=MEDIA_GROUP_LIMIT`
    pub max_page_size: usize,
    /// Minimum queue length for an album to be posted
    pub min_items: usize,
}

impl Default for AlbumSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_ALBUM_DEBOUNCE_MS),
            max_page_size: MEDIA_GROUP_LIMIT,
            min_items: DEFAULT_ALBUM_MIN_ITEMS,
        }
    }
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use album_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__ALBUM_DEBOUNCE_MS=800 ./target/album-bot`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain variables: BOT_TOKEN, PORT, ... (empty ones count as unset)
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Album settings with the page size clamped to what Telegram accepts
    #[must_use]
    pub fn album(&self) -> AlbumSettings {
        AlbumSettings {
            debounce: Duration::from_millis(self.album_debounce_ms),
            max_page_size: self.album_max_page_size.clamp(1, MEDIA_GROUP_LIMIT),
            min_items: self.album_min_items,
        }
    }
}
