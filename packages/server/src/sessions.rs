//! Per-session serialization and builder dialogue registry.

use std::collections::HashMap;
use std::sync::Arc;

use salescraft_builder::BuilderState;
use tokio::sync::Mutex;

/// Registry entries beyond this size trigger opportunistic pruning of
/// locks nobody currently holds.
const PRUNE_THRESHOLD: usize = 4096;

/// Hands out one async mutex per `(agent_id, session_id)` pair so that
/// concurrent turns on a single session read-modify-write the
/// conversation row in order. Turns on different sessions never contend.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl SessionLocks {
    /// Returns the lock for a session, creating it on first touch.
    pub async fn lock_for(&self, agent_id: &str, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;

        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        Arc::clone(
            locks
                .entry((agent_id.to_string(), session_id.to_string()))
                .or_default(),
        )
    }
}

/// In-memory builder dialogue states, keyed by dialogue token.
#[derive(Default)]
pub struct BuilderSessions {
    sessions: Mutex<HashMap<String, BuilderState>>,
}

impl BuilderSessions {
    /// Stores a dialogue state under a fresh token and returns it.
    pub async fn create(&self, state: BuilderState) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.lock().await.insert(token.clone(), state);
        token
    }

    /// Removes and returns a dialogue state for one turn of work; call
    /// [`Self::put_back`] with the updated state afterwards.
    pub async fn take(&self, token: &str) -> Option<BuilderState> {
        self.sessions.lock().await.remove(token)
    }

    /// Returns a dialogue state after a turn.
    pub async fn put_back(&self, token: &str, state: BuilderState) {
        self.sessions
            .lock()
            .await
            .insert(token.to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use salescraft_builder::{Accumulator, BuilderPhase};

    use super::*;

    #[tokio::test]
    async fn same_session_gets_same_lock() {
        let locks = SessionLocks::default();
        let a = locks.lock_for("agent", "session").await;
        let b = locks.lock_for("agent", "session").await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn different_sessions_get_different_locks() {
        let locks = SessionLocks::default();
        let a = locks.lock_for("agent", "s1").await;
        let b = locks.lock_for("agent", "s2").await;
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn builder_sessions_round_trip() {
        let sessions = BuilderSessions::default();
        let state = BuilderState {
            agent_id: "a1".to_string(),
            phase: BuilderPhase::AgentInfo,
            accumulator: Accumulator::default(),
        };

        let token = sessions.create(state).await;
        let taken = sessions.take(&token).await.expect("state should exist");
        assert_eq!(taken.agent_id, "a1");

        // Taken means gone until put back.
        assert!(sessions.take(&token).await.is_none());
        sessions.put_back(&token, taken).await;
        assert!(sessions.take(&token).await.is_some());
    }
}
