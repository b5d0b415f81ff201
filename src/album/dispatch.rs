use super::paginate::paginate;
use super::queue;
use super::transport::{MediaTransport, TransportError};
use crate::config::AlbumSettings;
use crate::i18n::Localizer;
use crate::storage::{SessionKey, Sessions, StorageError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Who an album is built for and which language to answer in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    /// Session owning the media queue
    pub key: SessionKey,
    /// Locale for notices, e.g. `en` or `ru-RU`
    pub locale: String,
}

impl ChatContext {
    /// Context for `key`, answering in `locale`
    #[must_use]
    pub fn new(key: SessionKey, locale: impl Into<String>) -> Self {
        Self {
            key,
            locale: locale.into(),
        }
    }

    /// Chat the album is posted to
    #[must_use]
    pub const fn chat_id(&self) -> i64 {
        self.key.chat_id
    }
}

/// How an album attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumOutcome {
    /// The queue was too short; nothing was sent and the queue is untouched
    InsufficientMedia,
    /// Every page was delivered
    Sent {
        /// Media groups sent
        pages: usize,
        /// Media items sent
        items: usize,
    },
    /// A page failed; later pages were dropped, earlier ones stay sent
    DispatchFailed {
        /// Media groups delivered before the failure
        sent_pages: usize,
        /// Media groups the album was split into
        total_pages: usize,
    },
}

/// Turns a session's media queue into posted media groups
pub struct AlbumDispatcher {
    sessions: Arc<Sessions>,
    transport: Arc<dyn MediaTransport>,
    localizer: Arc<Localizer>,
    settings: AlbumSettings,
}

impl AlbumDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        sessions: Arc<Sessions>,
        transport: Arc<dyn MediaTransport>,
        localizer: Arc<Localizer>,
        settings: AlbumSettings,
    ) -> Self {
        Self {
            sessions,
            transport,
            localizer,
            settings,
        }
    }

    /// Take the session's queue and post it as one or more media groups.
    ///
    /// Pages are sent one at a time, in order. The first failed page stops
    /// the album and the user receives a single failure notice.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be loaded or saved.
    /// Transport failures are reported through [`AlbumOutcome`].
    pub async fn create_album(&self, ctx: &ChatContext) -> Result<AlbumOutcome, StorageError> {
        let min_items = self.settings.min_items;
        let taken = self
            .sessions
            .update(ctx.key, |record| {
                if record.media_queue.len() < min_items {
                    None
                } else {
                    Some(queue::take(record))
                }
            })
            .await?;

        let pages = match taken.map(|media| paginate(media, self.settings.max_page_size)) {
            Some(Ok(pages)) => pages,
            Some(Err(_)) | None => {
                info!("Not enough media queued for {}", ctx.key);
                if let Err(e) = self.notify(ctx, "not_enough_media_items").await {
                    warn!("Could not tell {} the queue is too short: {}", ctx.key, e);
                }
                return Ok(AlbumOutcome::InsufficientMedia);
            }
        };

        let total_pages = pages.len();
        let mut items = 0;
        for (index, page) in pages.into_iter().enumerate() {
            let page_len = page.len();
            if let Err(e) = self.transport.send_media_group(ctx.chat_id(), page).await {
                warn!(
                    "Media group {}/{} for {} failed: {}",
                    index + 1,
                    total_pages,
                    ctx.key,
                    e
                );
                if let Err(notice_error) = self.notify(ctx, "album_create_error").await {
                    error!(
                        "Could not send album AND error message to {}: {}",
                        ctx.key, notice_error
                    );
                }
                return Ok(AlbumOutcome::DispatchFailed {
                    sent_pages: index,
                    total_pages,
                });
            }
            items += page_len;
        }

        info!(
            "Album for {} sent: {} items in {} media groups",
            ctx.key, items, total_pages
        );
        Ok(AlbumOutcome::Sent {
            pages: total_pages,
            items,
        })
    }

    /// Announce the album and create it. Runs when the debounce timer fires.
    pub async fn finalize(&self, ctx: &ChatContext) {
        if let Err(e) = self.notify(ctx, "album_done").await {
            warn!("Could not announce album for {}: {}", ctx.key, e);
        }
        if let Err(e) = self.create_album(ctx).await {
            error!("Album for {} aborted: {}", ctx.key, e);
        }
    }

    /// Send the localized message `key` to the context's chat
    ///
    /// # Errors
    ///
    /// Returns the transport error if the message cannot be sent.
    pub async fn notify(&self, ctx: &ChatContext, key: &str) -> Result<(), TransportError> {
        let text = self.localizer.t(&ctx.locale, key, &[]);
        self.transport.send_text(ctx.chat_id(), text).await
    }
}
