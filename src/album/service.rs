use super::debounce::Debouncer;
use super::dispatch::{AlbumDispatcher, AlbumOutcome, ChatContext};
use super::queue;
use super::transport::MediaTransport;
use crate::config::AlbumSettings;
use crate::i18n::Localizer;
use crate::storage::{MediaRef, SessionKey, SessionStore, Sessions, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Album pipeline as seen by the bot handlers
pub struct AlbumService {
    sessions: Arc<Sessions>,
    dispatcher: Arc<AlbumDispatcher>,
    timers: Debouncer<SessionKey>,
    settings: AlbumSettings,
}

impl AlbumService {
    /// Wire the pipeline on top of `store` and `transport`
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn MediaTransport>,
        localizer: Arc<Localizer>,
        settings: AlbumSettings,
    ) -> Self {
        let sessions = Arc::new(Sessions::new(store));
        let dispatcher = Arc::new(AlbumDispatcher::new(
            Arc::clone(&sessions),
            transport,
            localizer,
            settings,
        ));
        Self {
            sessions,
            dispatcher,
            timers: Debouncer::new(),
            settings,
        }
    }

    /// Queue `media` and restart the session's quiet-period timer.
    ///
    /// Returns the queue length after the append.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or saved; the timer
    /// is left untouched in that case.
    pub async fn on_media(
        &self,
        ctx: ChatContext,
        media: MediaRef,
    ) -> Result<usize, StorageError> {
        let queued = self
            .sessions
            .update(ctx.key, |record| {
                queue::append(record, media);
                record.media_queue.len()
            })
            .await?;
        debug!("Queued media #{} for {}", queued, ctx.key);

        let dispatcher = Arc::clone(&self.dispatcher);
        let key = ctx.key;
        self.timers
            .reset(key, self.settings.debounce, async move {
                dispatcher.finalize(&ctx).await;
            })
            .await;
        Ok(queued)
    }

    /// Post the album now instead of waiting for the timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or saved.
    pub async fn done(&self, ctx: &ChatContext) -> Result<AlbumOutcome, StorageError> {
        self.timers.cancel(&ctx.key).await;
        self.dispatcher.create_album(ctx).await
    }

    /// Drop everything queued for the session and confirm to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or saved.
    pub async fn clear(&self, ctx: &ChatContext) -> Result<(), StorageError> {
        self.timers.cancel(&ctx.key).await;
        self.sessions.update(ctx.key, queue::clear).await?;
        if let Err(e) = self.dispatcher.notify(ctx, "queue_cleared").await {
            warn!("Could not confirm cleared queue to {}: {}", ctx.key, e);
        }
        Ok(())
    }

    /// Number of media items waiting for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded.
    pub async fn queued(&self, key: SessionKey) -> Result<usize, StorageError> {
        Ok(self.sessions.load(key).await?.media_queue.len())
    }

    /// Whether a finalization is scheduled for `key`
    pub async fn is_pending(&self, key: SessionKey) -> bool {
        self.timers.is_pending(&key).await
    }
}
