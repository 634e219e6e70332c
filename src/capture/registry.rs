use super::config::RegistryConfig;
use super::error::RegistryError;
use super::types::{CaptureSession, Frame, TranscriptFragment};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Mutable state of one capture session, owned by the registry
struct Entry {
    created_at: DateTime<Utc>,
    last_activity: Instant,
    frames: Vec<Frame>,
    transcripts: Vec<TranscriptFragment>,
    /// Set once the entry has left (or is leaving) the map.
    /// Anyone holding a stale handle must look the id up again.
    evicted: bool,
}

impl Entry {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_activity: Instant::now(),
            frames: Vec::new(),
            transcripts: Vec::new(),
            evicted: false,
        }
    }

    fn is_expired(&self, now: Instant, idle_ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > idle_ttl
    }

    fn snapshot(&self, id: &str) -> CaptureSession {
        CaptureSession {
            id: id.to_string(),
            created_at: self.created_at,
            frames: self.frames.clone(),
            transcripts: self.transcripts.clone(),
        }
    }
}

type EntryHandle = Arc<Mutex<Entry>>;

/// In-process store of live capture sessions
///
/// Sessions accumulate frames and transcript fragments while a lecture is
/// being captured, and are read once when the capture is consolidated.
///
/// Locking:
/// - The map lock is held only to look up, insert or remove an entry handle.
/// - Each session has its own mutex, so appends to one capture never wait
///   on appends to another.
/// - Sessions idle longer than `idle_ttl` are treated as absent and removed
///   lazily on access or by [`SessionRegistry::sweep_expired`].
pub struct SessionRegistry {
    config: RegistryConfig,
    sessions: RwLock<HashMap<String, EntryHandle>>,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create an empty session
    ///
    /// Fails with `AlreadyExists` if `id` is still live; the existing session is
    /// left untouched. An expired session under the same id is replaced.
    pub async fn create(&self, id: &str) -> Result<CaptureSession, RegistryError> {
        loop {
            if let Some(handle) = self.handle(id).await {
                let mut entry = handle.lock().await;
                if self.is_live(&entry) {
                    return Err(RegistryError::AlreadyExists(id.to_string()));
                }
                entry.evicted = true;
                drop(entry);
                self.detach(id, &handle).await;
            }

            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(id) {
                // Lost a race with another create or an upserting append
                continue;
            }

            let entry = Entry::new();
            let snapshot = entry.snapshot(id);
            sessions.insert(id.to_string(), Arc::new(Mutex::new(entry)));
            debug!("Capture session created: {}", id);

            return Ok(snapshot);
        }
    }

    /// Whether a live session exists for `id`
    pub async fn exists(&self, id: &str) -> bool {
        self.read_live(id, |_| ()).await.is_some()
    }

    /// Consistent snapshot of a live session
    pub async fn get(&self, id: &str) -> Result<CaptureSession, RegistryError> {
        self.read_live(id, |entry| entry.snapshot(id))
            .await
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Append a frame reference, creating the session if needed
    ///
    /// Returns the session's frame count after the append.
    pub async fn append_frame(
        &self,
        id: &str,
        storage_ref: impl Into<String>,
        display_name: impl Into<String>,
        offset_ms: u64,
    ) -> usize {
        let frame = Frame {
            storage_ref: storage_ref.into(),
            display_name: display_name.into(),
            offset_ms,
        };

        let mut entry = self.lock_for_append(id).await;
        entry.frames.push(frame);
        entry.frames.len()
    }

    /// Append a transcript fragment, creating the session if needed
    ///
    /// Returns the session's transcript count after the append.
    pub async fn append_transcript(&self, id: &str, text: impl Into<String>, offset_ms: u64) -> usize {
        let fragment = TranscriptFragment {
            text: text.into(),
            offset_ms,
        };

        let mut entry = self.lock_for_append(id).await;
        entry.transcripts.push(fragment);
        entry.transcripts.len()
    }

    /// Remove a session and release its memory
    ///
    /// Idempotent. Returns whether a session was removed.
    pub async fn evict(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);

        match removed {
            Some(handle) => {
                handle.lock().await.evicted = true;
                debug!("Capture session evicted: {}", id);
                true
            }
            None => false,
        }
    }

    /// Remove a live session and return its final state in one step
    ///
    /// Appends that race with `take` either land in the returned snapshot or
    /// start a new session; none are lost in between.
    pub async fn take(&self, id: &str) -> Result<CaptureSession, RegistryError> {
        let removed = self.sessions.write().await.remove(id);
        let handle = removed.ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let mut entry = handle.lock().await;
        let live = self.is_live(&entry);
        entry.evicted = true;
        debug!("Capture session taken: {}", id);

        if live {
            Ok(entry.snapshot(id))
        } else {
            Err(RegistryError::NotFound(id.to_string()))
        }
    }

    /// Remove every session idle for longer than `idle_ttl`
    ///
    /// Sessions with an append in progress are skipped this round.
    /// Returns the number of sessions removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let idle_ttl = self.config.idle_ttl;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(mut entry) => {
                if entry.evicted || entry.is_expired(now, idle_ttl) {
                    entry.evicted = true;
                    debug!("Capture session expired: {}", id);
                    false
                } else {
                    true
                }
            }
            Err(_) => true,
        });

        before - sessions.len()
    }

    /// Number of sessions held, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of live sessions; expired ones awaiting a sweep are not counted
    ///
    /// Never waits on a session lock. A session mid-append is live.
    pub async fn live_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|handle| match handle.try_lock() {
                Ok(entry) => self.is_live(&entry),
                Err(_) => true,
            })
            .count()
    }

    async fn handle(&self, id: &str) -> Option<EntryHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    fn is_live(&self, entry: &Entry) -> bool {
        !entry.evicted && !entry.is_expired(Instant::now(), self.config.idle_ttl)
    }

    /// Run `read` against a live entry, retiring it first if it has expired
    async fn read_live<T>(&self, id: &str, read: impl FnOnce(&Entry) -> T) -> Option<T> {
        let handle = self.handle(id).await?;

        let result = {
            let mut entry = handle.lock().await;
            if self.is_live(&entry) {
                Some(read(&*entry))
            } else {
                entry.evicted = true;
                None
            }
        };

        if result.is_none() {
            self.detach(id, &handle).await;
        }

        result
    }

    /// Lock the live entry for `id`, inserting a fresh one when absent or expired
    async fn lock_for_append(&self, id: &str) -> OwnedMutexGuard<Entry> {
        loop {
            let handle = self.upsert_handle(id).await;
            let mut entry = Arc::clone(&handle).lock_owned().await;

            if self.is_live(&entry) {
                entry.last_activity = Instant::now();
                return entry;
            }

            entry.evicted = true;
            drop(entry);
            self.detach(id, &handle).await;
        }
    }

    async fn upsert_handle(&self, id: &str) -> EntryHandle {
        if let Some(handle) = self.handle(id).await {
            return handle;
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!("Capture session created on first append: {}", id);
            Arc::new(Mutex::new(Entry::new()))
        });

        Arc::clone(handle)
    }

    /// Drop `handle` from the map if it is still the entry stored under `id`
    async fn detach(&self, id: &str, handle: &EntryHandle) {
        let mut sessions = self.sessions.write().await;
        if matches!(sessions.get(id), Some(current) if Arc::ptr_eq(current, handle)) {
            sessions.remove(id);
            debug!("Capture session expired: {}", id);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const PROMPT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_locked_session_does_not_block_other_sessions() {
        let registry = Arc::new(SessionRegistry::default());
        registry.append_frame("a", "r0", "a0.jpg", 0).await;

        // Simulate a slow append on "a" by holding its entry lock
        let handle = registry.handle("a").await.expect("session a should exist");
        let held = handle.lock().await;

        let other = Arc::clone(&registry);
        let result = timeout(PROMPT, async move {
            other.append_frame("b", "r1", "b0.jpg", 0).await;
            other.append_transcript("b", "hello", 10).await;
            other.create("c").await.expect("create c");
            other.exists("b").await;
            other.get("b").await.expect("get b");
            other.evict("c").await;
        })
        .await;

        assert!(result.is_ok(), "Operations on other sessions should not wait on session a");

        // A concurrent append to "a" waits until the lock is released, then lands
        let pending = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.append_frame("a", "r2", "a1.jpg", 100).await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        drop(held);
        let count = timeout(PROMPT, pending).await.expect("append should finish").expect("task");
        assert_eq!(count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_skips_entries_with_append_in_progress() {
        let registry = SessionRegistry::new(RegistryConfig {
            idle_ttl: Duration::from_millis(10),
            sweep_interval: Duration::from_secs(60),
        });
        registry.append_transcript("busy", "x", 0).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let handle = registry.handle("busy").await.expect("session should exist");
        let held = handle.lock().await;
        assert_eq!(registry.sweep_expired().await, 0);
        drop(held);

        assert_eq!(registry.sweep_expired().await, 1);
        assert!(handle.lock().await.evicted);
    }

    #[test]
    fn test_entry_expiry_is_strictly_after_ttl() {
        let entry = Entry::new();
        let ttl = Duration::from_secs(5);

        assert!(!entry.is_expired(entry.last_activity + ttl, ttl));
        assert!(entry.is_expired(entry.last_activity + ttl + Duration::from_millis(1), ttl));
    }
}
