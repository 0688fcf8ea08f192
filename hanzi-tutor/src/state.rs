//! Shared application state
//!
//! Holds the database pool, the event bus, the collaborators and the
//! registry of live learning sessions (one per logged-in user).

use crate::error::{Error, Result};
use crate::session::{Collaborators, LearningSession};
use hanzi_common::db::User;
use hanzi_common::events::EventBus;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// State shared by the HTTP layer and background tasks
pub struct SharedState {
    pub db: Pool<Sqlite>,
    pub events: Arc<EventBus>,
    pub collaborators: Collaborators,
    sessions: RwLock<HashMap<i64, LearningSession>>,
}

impl SharedState {
    pub fn new(db: Pool<Sqlite>, events: Arc<EventBus>, collaborators: Collaborators) -> Self {
        Self {
            db,
            events,
            collaborators,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh session for `user`, replacing any previous one
    pub async fn open_session(&self, user: User) -> Result<LearningSession> {
        let previous = self.sessions.write().await.remove(&user.id);
        if let Some(previous) = previous {
            previous.stop().await;
        }

        let user_id = user.id;
        let session = LearningSession::new(
            self.db.clone(),
            Arc::clone(&self.events),
            self.collaborators.clone(),
            user,
        );
        session.start().await?;

        self.sessions.write().await.insert(user_id, session.clone());
        Ok(session)
    }

    /// Live session of a user
    pub async fn session(&self, user_id: i64) -> Result<LearningSession> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no session for user {}", user_id)))
    }

    /// Stop and forget a user's session; false when none was open
    pub async fn close_session(&self, user_id: i64) -> bool {
        let session = self.sessions.write().await.remove(&user_id);
        match session {
            Some(session) => {
                session.stop().await;
                true
            }
            None => false,
        }
    }

    /// Stop every session (shutdown)
    pub async fn stop_all(&self) {
        let sessions: Vec<LearningSession> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        if !sessions.is_empty() {
            info!("Stopping {} active sessions", sessions.len());
        }
        for session in sessions {
            session.stop().await;
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
