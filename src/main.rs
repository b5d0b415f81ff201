use album_bot::album::AlbumService;
use album_bot::bot::{runner, TelegramTransport};
use album_bot::config::Settings;
use album_bot::i18n::Localizer;
use album_bot::storage::LocalSessionStore;
use album_bot::web;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting the bot token
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ in size
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting Album Bot...");

    let settings = init_settings();
    let store = init_storage(&settings).await;
    let localizer = init_localizer(&settings);

    let bot = Bot::new(settings.bot_token.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let service = Arc::new(AlbumService::new(
        store,
        transport,
        localizer.clone(),
        settings.album(),
    ));

    if let Some(port) = settings.port {
        let public_dir = settings.public_dir.clone();
        tokio::spawn(async move {
            if let Err(e) = web::serve(port, public_dir).await {
                error!("Landing page stopped: {}", e);
            }
        });
    }

    runner::run_bot(bot, service, localizer).await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_storage(settings: &Settings) -> Arc<LocalSessionStore> {
    let store = match LocalSessionStore::open(&settings.session_db).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open session store {}: {}", settings.session_db, e);
            std::process::exit(1);
        }
    };

    match store.clear_media_queues().await {
        Ok(cleared) => info!("Session store ready, cleared {} pending media queues.", cleared),
        Err(e) => {
            error!("Failed to reset media queues: {}", e);
            std::process::exit(1);
        }
    }
    Arc::new(store)
}

fn init_localizer(settings: &Settings) -> Arc<Localizer> {
    let dir = Path::new(&settings.locales_dir);
    if !dir.is_dir() {
        info!("No locale directory at {}, using built-in locales.", dir.display());
        return Arc::new(Localizer::builtin(&settings.default_language));
    }

    match Localizer::from_dir(dir, &settings.default_language) {
        Ok(localizer) => Arc::new(localizer),
        Err(e) => {
            warn!("Failed to load locales, using built-in ones: {}", e);
            Arc::new(Localizer::builtin(&settings.default_language))
        }
    }
}
