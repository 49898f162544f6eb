//! Registry of live recognition sessions.
//!
//! Each session's [`SessionState`] sits behind its own async mutex so one
//! session is processed strictly in order while different sessions run in
//! parallel. Entries carry a generation so a connection that reused an id
//! cannot remove the state of the connection that replaced it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::stabilizer::SessionState;

/// Shared handle to one session's state.
pub type SharedSession = Arc<AsyncMutex<SessionState>>;

struct SessionEntry {
    category: String,
    generation: u64,
    state: SharedSession,
    last_active: Instant,
}

/// Identifies one registration of a session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub generation: u64,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    next_generation: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `state` under `id`, replacing any previous session with that id.
    pub fn create(&self, id: &str, category: &str, state: SessionState) -> SessionTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = SessionEntry {
            category: category.to_string(),
            generation,
            state: Arc::new(AsyncMutex::new(state)),
            last_active: Instant::now(),
        };

        if self.sessions.lock().insert(id.to_string(), entry).is_some() {
            debug!("Session {} re-registered with fresh state", id);
        }

        SessionTicket { generation }
    }

    /// The state registered under `id` by `ticket`, marking it active.
    ///
    /// Returns `None` if the session was reaped or replaced.
    pub fn checkout(&self, id: &str, ticket: SessionTicket) -> Option<SharedSession> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id)?;
        if entry.generation != ticket.generation {
            return None;
        }
        entry.last_active = Instant::now();
        Some(entry.state.clone())
    }

    /// Remove the session registered under `id` by `ticket`.
    pub fn remove(&self, id: &str, ticket: SessionTicket) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(id) {
            Some(entry) if entry.generation == ticket.generation => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Number of live sessions per category.
    pub fn counts_by_category(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for entry in self.sessions.lock().values() {
            *counts.entry(entry.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop sessions idle for longer than `max_idle`; returns how many.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_active) <= max_idle);
        before - sessions.len()
    }

    /// Periodically reap idle sessions until the returned task is aborted.
    pub fn spawn_reaper(
        store: Arc<Self>,
        interval: Duration,
        max_idle: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let reaped = store.reap_idle(max_idle);
                if reaped > 0 {
                    info!(
                        "Reaped {} idle session(s), {} remaining",
                        reaped,
                        store.len()
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stabilizer::StabilizerConfig;

    fn state() -> SessionState {
        SessionState::new(StabilizerConfig::default())
    }

    #[test]
    fn test_create_checkout_remove() {
        let store = SessionStore::new();
        let ticket = store.create("s1", "letters", state());

        assert!(store.contains("s1"));
        assert!(store.checkout("s1", ticket).is_some());
        assert!(store.remove("s1", ticket));
        assert!(store.is_empty());
        assert!(store.checkout("s1", ticket).is_none());
    }

    #[tokio::test]
    async fn test_reregistering_gives_fresh_state() {
        let store = SessionStore::new();
        let first = store.create("s1", "letters", state());
        {
            let shared = store.checkout("s1", first).unwrap();
            let mut session = shared.lock().await;
            for _ in 0..5 {
                session.begin(&[0.5; 6], Some("A"));
            }
            assert_eq!(session.last_target(), Some("A"));
        }

        let second = store.create("s1", "letters", state());
        assert_ne!(first, second);
        assert_eq!(store.len(), 1);

        // the replaced connection can no longer see or remove the session
        assert!(store.checkout("s1", first).is_none());
        assert!(!store.remove("s1", first));

        let shared = store.checkout("s1", second).unwrap();
        assert_eq!(shared.lock().await.last_target(), None);
    }

    #[test]
    fn test_reap_idle() {
        let store = SessionStore::new();
        store.create("s1", "letters", state());
        store.create("s2", "days", state());

        assert_eq!(store.reap_idle(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.reap_idle(Duration::from_millis(5)), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_counts_by_category() {
        let store = SessionStore::new();
        store.create("s1", "letters", state());
        store.create("s2", "letters", state());
        store.create("s3", "days", state());

        let counts = store.counts_by_category();
        assert_eq!(counts["letters"], 2);
        assert_eq!(counts["days"], 1);
    }

    #[tokio::test]
    async fn test_reaper_task_removes_idle_sessions() {
        let store = Arc::new(SessionStore::new());
        store.create("s1", "letters", state());

        let handle = SessionStore::spawn_reaper(
            store.clone(),
            Duration::from_millis(10),
            Duration::ZERO,
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.is_empty());
        handle.abort();
    }
}
