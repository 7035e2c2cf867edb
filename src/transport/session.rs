//! Per-session state (C7): state machine, outbound queue, idle tracking.
//! Session registry mutation (create/destroy) happens under a lock; lookups
//! share the same lock for read access — a `tokio::sync::RwLock`-guarded map
//! rather than a lock-free structure, since no concurrent-map crate appears
//! anywhere in the reference pool and session churn is low relative to
//! request volume.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Opening,
    Initialized,
    Active,
    Closing,
    Closed,
}

pub struct Session {
    pub id: Uuid,
    pub created_at: Instant,
    pub authenticated_principal: Option<String>,
    pub outbound_tx: mpsc::Sender<Value>,
    phase: std::sync::Mutex<SessionPhase>,
    last_activity_at: std::sync::Mutex<Instant>,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock().expect("session phase lock poisoned")
    }

    pub fn set_phase(&self, phase: SessionPhase) {
        *self.phase.lock().expect("session phase lock poisoned") = phase;
    }

    pub fn touch(&self) {
        *self
            .last_activity_at
            .lock()
            .expect("session activity lock poisoned") = Instant::now();
    }

    pub fn idle_for(&self) -> std::time::Duration {
        self.last_activity_at
            .lock()
            .expect("session activity lock poisoned")
            .elapsed()
    }

    /// `initialize` must be the first method seen in `Opening`; any other
    /// method from `Opening` is a protocol error.
    pub fn accepts_method(&self, method: &str) -> bool {
        match self.phase() {
            SessionPhase::Opening => method == "initialize",
            SessionPhase::Initialized | SessionPhase::Active => true,
            SessionPhase::Closing | SessionPhase::Closed => false,
        }
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a session and returns it along with the receiving half of its
    /// outbound queue. The receiver must be driven by exactly one task (the
    /// SSE stream for this session) — per §5, concurrent writes to the same
    /// stream are forbidden, so only one reader ever drains this channel.
    pub async fn create(&self, queue_capacity: usize) -> (Arc<Session>, mpsc::Receiver<Value>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            created_at: Instant::now(),
            authenticated_principal: None,
            outbound_tx: tx,
            phase: std::sync::Mutex::new(SessionPhase::Opening),
            last_activity_at: std::sync::Mutex::new(Instant::now()),
        });
        self.sessions.write().await.insert(session.id, session.clone());
        (session, rx)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    pub async fn sweep_idle(&self, idle_timeout: std::time::Duration) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| {
            let expired = s.idle_for() >= idle_timeout;
            if expired {
                s.set_phase(SessionPhase::Closed);
            }
            !expired
        });
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_session_starts_opening_and_only_accepts_initialize() {
        let registry = SessionRegistry::new();
        let (session, _rx) = registry.create(8).await;
        assert_eq!(session.phase(), SessionPhase::Opening);
        assert!(session.accepts_method("initialize"));
        assert!(!session.accepts_method("tools/call"));
    }

    #[tokio::test]
    async fn after_initialize_other_methods_are_accepted() {
        let registry = SessionRegistry::new();
        let (session, _rx) = registry.create(8).await;
        session.set_phase(SessionPhase::Initialized);
        assert!(session.accepts_method("tools/call"));
    }

    #[tokio::test]
    async fn registry_lookup_and_removal() {
        let registry = SessionRegistry::new();
        let (session, _rx) = registry.create(8).await;
        assert!(registry.get(session.id).await.is_some());
        registry.remove(session.id).await;
        assert!(registry.get(session.id).await.is_none());
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = registry.create(8).await;
        let (b, _rx_b) = registry.create(8).await;
        assert_ne!(a.id, b.id);
    }
}
