//! Per-session transcript storage.
//!
//! The store is a pluggable capability: the service only needs
//! fetch/append/delete semantics, so alternative backends (bounded caches,
//! shared stores) can slot in behind [`SessionStore`] without touching the
//! agent loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::message::Turn;

/// Append-only turn history for one session. Strict insertion order, no
/// compaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Storage contract for session transcripts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the transcript for `session_id`, creating an empty one on first
    /// use. Returns a snapshot; mutations go through [`SessionStore::append`].
    async fn get_or_create(&self, session_id: &str) -> Transcript;

    async fn append(&self, session_id: &str, turn: Turn);

    /// Snapshot of an existing session, or `None` if it was never created.
    async fn get(&self, session_id: &str) -> Option<Transcript>;

    /// Remove a session. `false` if it was absent.
    async fn delete(&self, session_id: &str) -> bool;
}

/// Process-wide in-memory store. Grows without bound; eviction is left to
/// alternative [`SessionStore`] implementations.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Transcript>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: &str) -> Transcript {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    async fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(turn);
    }

    async fn get(&self, session_id: &str) -> Option<Transcript> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn delete(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}

/// Hands out one mutual-exclusion token per session id so that at most one
/// agent loop is in flight per session. Appends from concurrent requests to
/// the same session would otherwise interleave non-deterministically.
#[derive(Default)]
pub struct SessionGates {
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate for `session_id`, waiting if another invocation
    /// holds it. The guard releases on drop.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.gates.lock().await;
            Arc::clone(gates.entry(session_id.to_string()).or_default())
        };
        gate.lock_owned().await
    }

    pub async fn remove(&self, session_id: &str) {
        self.gates.lock().await.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContentBlock, Turn};
    use serde_json::json;

    #[tokio::test]
    async fn append_then_get_preserves_order_and_content() {
        let store = InMemorySessionStore::new();
        let turns = vec![
            Turn::user("first"),
            Turn::assistant("second"),
            Turn::user_blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: json!({"ok": true}).to_string(),
            }]),
        ];

        for turn in &turns {
            store.append("s1", turn.clone()).await;
        }

        let transcript = store.get("s1").await.unwrap();
        assert_eq!(transcript.turns(), turns.as_slice());
    }

    #[tokio::test]
    async fn get_or_create_starts_empty() {
        let store = InMemorySessionStore::new();
        assert!(store.get("fresh").await.is_none());

        let transcript = store.get_or_create("fresh").await;
        assert!(transcript.is_empty());
        assert!(store.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn delete_is_observably_idempotent() {
        let store = InMemorySessionStore::new();
        assert!(!store.delete("missing").await);

        store.append("s1", Turn::user("hello")).await;
        assert!(store.delete("s1").await);
        assert!(store.get("s1").await.is_none());
        assert!(!store.delete("s1").await);
    }

    #[tokio::test]
    async fn gate_serializes_same_session() {
        let gates = Arc::new(SessionGates::new());
        let first = gates.lock("s1").await;

        let contender = tokio::spawn({
            let gates = Arc::clone(&gates);
            async move {
                let _guard = gates.lock("s1").await;
            }
        });

        // The contender cannot finish while the first guard is held.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_contend() {
        let gates = SessionGates::new();
        let _a = gates.lock("a").await;
        let _b = gates.lock("b").await;
    }
}
