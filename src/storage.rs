//! Storage layer for user sessions
//!
//! Sessions live in memory and are mirrored to a JSON file so that they
//! survive restarts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity of a session: one user talking in one chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Telegram user ID
    pub user_id: i64,
    /// Telegram chat ID
    pub chat_id: i64,
}

impl SessionKey {
    /// Create a key for `user_id` in `chat_id`
    #[must_use]
    pub const fn new(user_id: i64, chat_id: i64) -> Self {
        Self { user_id, chat_id }
    }

    fn parse(raw: &str) -> Option<Self> {
        let (user, chat) = raw.split_once(':')?;
        Some(Self::new(user.parse().ok()?, chat.parse().ok()?))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.chat_id)
    }
}

/// Kind of an uploaded media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Photo
    Photo,
    /// Video
    Video,
}

/// Reference to a media asset already uploaded to Telegram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Photo or video
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Telegram file ID
    #[serde(rename = "media")]
    pub id: String,
}

impl MediaRef {
    /// Reference to a photo
    #[must_use]
    pub fn photo(id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            id: id.into(),
        }
    }

    /// Reference to a video
    #[must_use]
    pub fn video(id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            id: id.into(),
        }
    }
}

/// Per-user state persisted across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Media waiting to be posted, in posting order
    #[serde(default)]
    pub media_queue: Vec<MediaRef>,
}

/// Interface for session storage providers
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for `key`, or a fresh one if none is stored
    async fn load(&self, key: SessionKey) -> Result<SessionRecord, StorageError>;
    /// Store the session for `key`
    async fn save(&self, key: SessionKey, record: SessionRecord) -> Result<(), StorageError>;
}

#[derive(Serialize, Deserialize, Default)]
struct SessionsFile {
    sessions: Vec<SessionEntry>,
}

#[derive(Serialize, Deserialize)]
struct SessionEntry {
    id: String,
    data: SessionRecord,
}

/// Session store backed by a local JSON file
pub struct LocalSessionStore {
    path: Option<PathBuf>,
    sessions: RwLock<HashMap<SessionKey, SessionRecord>>,
}

impl LocalSessionStore {
    /// Open the store at `path`, loading existing sessions if the file exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut sessions = HashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: SessionsFile = serde_json::from_slice(&bytes)?;
                for entry in file.sessions {
                    if let Some(key) = SessionKey::parse(&entry.id) {
                        sessions.insert(key, entry.data);
                    } else {
                        debug!("Skipping session with malformed id {:?}", entry.id);
                    }
                }
                info!("Loaded {} sessions from {}", sessions.len(), path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No session file at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path: Some(path),
            sessions: RwLock::new(sessions),
        })
    }

    /// Store that never touches the disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Empty every stored media queue.
    ///
    /// Run at startup: a restart abandons albums that were being collected.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions cannot be written back.
    pub async fn clear_media_queues(&self) -> Result<usize, StorageError> {
        let mut sessions = self.sessions.write().await;
        let mut next = sessions.clone();
        let mut cleared = 0;
        for record in next.values_mut() {
            if !record.media_queue.is_empty() {
                record.media_queue.clear();
                cleared += 1;
            }
        }
        self.persist(&next).await?;
        *sessions = next;
        Ok(cleared)
    }

    async fn persist(
        &self,
        sessions: &HashMap<SessionKey, SessionRecord>,
    ) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut entries: Vec<SessionEntry> = sessions
            .iter()
            .map(|(key, record)| SessionEntry {
                id: key.to_string(),
                data: record.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let json = serde_json::to_vec_pretty(&SessionsFile { sessions: entries })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn load(&self, key: SessionKey) -> Result<SessionRecord, StorageError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, key: SessionKey, record: SessionRecord) -> Result<(), StorageError> {
        // Hold the write lock while persisting so file writes never interleave
        let mut sessions = self.sessions.write().await;
        let mut next = sessions.clone();
        next.insert(key, record);
        self.persist(&next).await?;
        *sessions = next;
        Ok(())
    }
}

/// Serialized access to session records.
///
/// Every read-modify-write of one session runs under that session's lock,
/// so an append can never interleave with a drain of the same queue. Locks
/// exist only while an update for their session is running or waiting.
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    locks: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl Sessions {
    /// Wrap `store`
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load the session for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn load(&self, key: SessionKey) -> Result<SessionRecord, StorageError> {
        self.store.load(key).await
    }

    /// Apply `change` to the session for `key` and save the result.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails. On a failed load,
    /// `change` is not called. On a failed save the stored record is left
    /// as it was.
    pub async fn update<R>(
        &self,
        key: SessionKey,
        change: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<R, StorageError> {
        let lock = Arc::clone(self.locks.lock().await.entry(key).or_default());
        let result = {
            let _guard = lock.lock().await;
            self.apply(key, change).await
        };
        drop(lock);
        self.release(key).await;
        result
    }

    async fn apply<R>(
        &self,
        key: SessionKey,
        change: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<R, StorageError> {
        let mut record = self.store.load(key).await?;
        let result = change(&mut record);
        self.store.save(key, record).await?;
        Ok(result)
    }

    /// Forget the lock for `key` once no update holds or waits on it
    async fn release(&self, key: SessionKey) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(&key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_round_trip() {
        let key = SessionKey::new(42, -100_123);
        assert_eq!(key.to_string(), "42:-100123");
        assert_eq!(SessionKey::parse("42:-100123"), Some(key));
        assert_eq!(SessionKey::parse("garbage"), None);
    }

    #[test]
    fn test_record_without_queue_is_empty() -> Result<(), serde_json::Error> {
        let record: SessionRecord = serde_json::from_str("{}")?;
        assert!(record.media_queue.is_empty());
        Ok(())
    }

    #[test]
    fn test_media_ref_wire_shape() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(MediaRef::video("abc"))?;
        assert_eq!(json, serde_json::json!({ "type": "video", "media": "abc" }));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() -> Result<(), StorageError> {
        let sessions = Arc::new(Sessions::new(Arc::new(LocalSessionStore::in_memory())));
        let key = SessionKey::new(1, 1);

        let mut tasks = Vec::new();
        for i in 0..50 {
            let sessions = Arc::clone(&sessions);
            tasks.push(tokio::spawn(async move {
                sessions
                    .update(key, |record| {
                        record.media_queue.push(MediaRef::photo(i.to_string()));
                    })
                    .await
            }));
        }
        for task in tasks {
            if let Ok(result) = task.await {
                result?;
            }
        }

        assert_eq!(sessions.load(key).await?.media_queue.len(), 50);
        assert!(sessions.locks.lock().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_locks_are_released_per_session() -> Result<(), StorageError> {
        let sessions = Sessions::new(Arc::new(LocalSessionStore::in_memory()));
        for id in 0..20 {
            sessions
                .update(SessionKey::new(id, id), |record| {
                    record.media_queue.push(MediaRef::photo("p"));
                })
                .await?;
        }
        assert!(sessions.locks.lock().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_record() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let db = dir.path().join("db");
        std::fs::create_dir(&db)?;
        let key = SessionKey::new(1, 1);

        let store = LocalSessionStore::open(db.join("sessions.json")).await?;
        let record = SessionRecord {
            media_queue: vec![MediaRef::photo("a")],
        };
        store.save(key, record.clone()).await?;

        std::fs::remove_dir_all(&db)?;
        assert!(matches!(
            store.save(key, SessionRecord::default()).await,
            Err(StorageError::Io(_))
        ));
        assert!(matches!(
            store.clear_media_queues().await,
            Err(StorageError::Io(_))
        ));
        assert_eq!(store.load(key).await?, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_session_loads_default() -> Result<(), StorageError> {
        let store = LocalSessionStore::in_memory();
        let record = store.load(SessionKey::new(1, 1)).await?;
        assert_eq!(record, SessionRecord::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_sessions_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sessions.json");
        let key = SessionKey::new(7, 7);

        let store = LocalSessionStore::open(&path).await?;
        let record = SessionRecord {
            media_queue: vec![MediaRef::photo("p1"), MediaRef::video("v1")],
        };
        store.save(key, record.clone()).await?;

        let reopened = LocalSessionStore::open(&path).await?;
        assert_eq!(reopened.load(key).await?, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_media_queues() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sessions.json");

        let store = LocalSessionStore::open(&path).await?;
        let full = SessionRecord {
            media_queue: vec![MediaRef::photo("p1")],
        };
        store.save(SessionKey::new(1, 1), full.clone()).await?;
        store.save(SessionKey::new(2, 2), full).await?;
        store.save(SessionKey::new(3, 3), SessionRecord::default()).await?;

        assert_eq!(store.clear_media_queues().await?, 2);

        let reopened = LocalSessionStore::open(&path).await?;
        for id in 1..=3 {
            let record = reopened.load(SessionKey::new(id, id)).await?;
            assert!(record.media_queue.is_empty());
        }
        Ok(())
    }
}
