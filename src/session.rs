//! SessionStore: in-memory map from user id to that user's quiz snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::quiz::{Prompt, QuizEngine, Session};

/// Owns every live session. Each user has at most one.
///
/// The map lock is only held for the map operation itself. Callers work on
/// cloned snapshots and write them back with `advance`, so no lock is held
/// while a reply is sent or a result is stored.
pub struct SessionStore {
    engine: Arc<QuizEngine>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(engine: Arc<QuizEngine>) -> Self {
        Self {
            engine,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the user's session, creating a fresh one if none exists.
    pub async fn get_or_create(&self, user_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id = %user_id, "Session created");
                self.engine.begin(user_id).0
            })
            .clone()
    }

    /// Replace any existing session with a fresh one.
    pub async fn restart(&self, user_id: &str) -> (Session, Prompt) {
        let (session, prompt) = self.engine.begin(user_id);
        let previous = self
            .sessions
            .write()
            .await
            .insert(user_id.to_string(), session.clone());
        if let Some(previous) = previous {
            debug!(
                user_id = %user_id,
                abandoned_at = %previous.state,
                "Session restarted"
            );
        }
        (session, prompt)
    }

    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Store a new snapshot for a user who already has a session.
    /// Returns `false` (and stores nothing) when the session is gone.
    pub async fn advance(&self, user_id: &str, next: Session) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(user_id) {
            Some(slot) => {
                *slot = next;
                true
            }
            None => {
                debug!(user_id = %user_id, "Dropping update for missing session");
                false
            }
        }
    }

    /// Delete a user's session. Returns the removed snapshot, if any.
    pub async fn remove(&self, user_id: &str) -> Option<Session> {
        self.sessions.write().await.remove(user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
