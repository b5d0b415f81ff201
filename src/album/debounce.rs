//! Keyed debounce timers
//!
//! Each key owns at most one pending action. Scheduling a new action for a
//! key cancels the previous one, so only the last action of a burst runs.
//! Keys are independent: resetting one never touches another.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

struct Slot {
    generation: u64,
    token: CancellationToken,
}

/// Debounce timers, one slot per key
pub struct Debouncer<K> {
    slots: Arc<Mutex<HashMap<K, Slot>>>,
    generation: AtomicU64,
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }
}

impl<K> Debouncer<K>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
{
    /// Create a debouncer with no pending actions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is pending for `key` and run `action` once `delay`
    /// has passed without another reset of the same key.
    pub async fn reset<F>(&self, key: K, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        {
            let mut slots = self.slots.lock().await;
            let previous = slots.insert(
                key.clone(),
                Slot {
                    generation,
                    token: token.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.token.cancel();
            }
        }

        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    trace!("Debounce for {:?} superseded", key);
                }
                () = tokio::time::sleep(delay) => {
                    // A reset may have raced the timer; only the current slot fires
                    let fire = {
                        let mut slots = slots.lock().await;
                        match slots.get(&key) {
                            Some(slot) if slot.generation == generation => {
                                slots.remove(&key);
                                true
                            }
                            _ => false,
                        }
                    };
                    if fire {
                        action.await;
                    }
                }
            }
        });
    }

    /// Drop the pending action for `key` without running it.
    ///
    /// Returns `true` if something was pending.
    pub async fn cancel(&self, key: &K) -> bool {
        let Some(slot) = self.slots.lock().await.remove(key) else {
            return false;
        };
        slot.token.cancel();
        true
    }

    /// Whether an action is waiting for `key`
    pub async fn is_pending(&self, key: &K) -> bool {
        self.slots.lock().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    type Log = Arc<StdMutex<Vec<&'static str>>>;

    fn record(log: &Log, entry: &'static str) -> impl Future<Output = ()> + Send + 'static {
        let log = Arc::clone(log);
        async move {
            if let Ok(mut entries) = log.lock() {
                entries.push(entry);
            }
        }
    }

    fn entries(log: &Log) -> Vec<&'static str> {
        log.lock().map(|entries| entries.clone()).unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_runs_after_delay() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer
            .reset(1, Duration::from_millis(500), record(&log, "fired"))
            .await;
        assert!(debouncer.is_pending(&1).await);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(entries(&log).is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(entries(&log), vec!["fired"]);
        assert!(!debouncer.is_pending(&1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_reset_wins() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer
            .reset(1, Duration::from_millis(500), record(&log, "first"))
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer
            .reset(1, Duration::from_millis(500), record(&log, "second"))
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer
            .reset(1, Duration::from_millis(500), record(&log, "third"))
            .await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(entries(&log), vec!["third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_action() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer
            .reset(1, Duration::from_millis(500), record(&log, "fired"))
            .await;
        assert!(debouncer.cancel(&1).await);
        assert!(!debouncer.cancel(&1).await);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(entries(&log).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_do_not_interfere() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer
            .reset("alice", Duration::from_millis(500), record(&log, "alice"))
            .await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer
            .reset("bob", Duration::from_millis(500), record(&log, "bob"))
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(entries(&log), vec!["alice"]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(entries(&log), vec!["alice", "bob"]);
    }
}
