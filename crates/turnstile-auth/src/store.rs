//! Session stores
//!
//! The session store is the only shared mutable state of the authority. Two
//! implementations are provided: a process-local map and the SQLite
//! `sessions` table.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use turnstile_db::{Database, DbError, NewSession, SessionRecord};

use crate::error::AuthError;

/// Session store trait
///
/// Every method must be atomic with respect to the others: a session is
/// either fully present or absent, and a lookup ordered after a completed
/// `remove` never sees the removed session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new `session_id -> user_id` association
    ///
    /// Fails with `InvalidInput` if `session_id` is already bound.
    async fn insert(&self, session_id: &str, user_id: &str) -> Result<SessionRecord, AuthError>;

    /// Look up a session
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError>;

    /// Remove a session, returning whether it existed
    async fn remove(&self, session_id: &str) -> Result<bool, AuthError>;

    /// Remove every session owned by `user_id`, returning how many were removed
    async fn remove_for_user(&self, user_id: &str) -> Result<usize, AuthError>;
}

/// In-memory session store (process lifetime)
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session_id: &str, user_id: &str) -> Result<SessionRecord, AuthError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(session_id) {
            return Err(AuthError::InvalidInput("session id already issued".to_string()));
        }

        let record = SessionRecord {
            id: session_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        sessions.insert(session_id.to_string(), record.clone());
        Ok(record)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> Result<bool, AuthError> {
        Ok(self.sessions.write().remove(session_id).is_some())
    }

    async fn remove_for_user(&self, user_id: &str) -> Result<usize, AuthError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, record| record.user_id != user_id);
        Ok(before - sessions.len())
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn insert(&self, session_id: &str, user_id: &str) -> Result<SessionRecord, AuthError> {
        self.insert_session(NewSession {
            id: session_id.to_string(),
            user_id: user_id.to_string(),
        })
        .await
        .map_err(|e| match e {
            DbError::Duplicate(msg) => AuthError::InvalidInput(msg),
            other => AuthError::Database(other),
        })
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError> {
        Ok(self.get_session(session_id).await?)
    }

    async fn remove(&self, session_id: &str) -> Result<bool, AuthError> {
        Ok(self.delete_session(session_id).await?)
    }

    async fn remove_for_user(&self, user_id: &str) -> Result<usize, AuthError> {
        Ok(self.delete_sessions_for_user(user_id).await? as usize)
    }
}
