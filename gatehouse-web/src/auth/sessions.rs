//! Server-side session storage.
//!
//! The browser only ever holds the signed session id; the identity lives in
//! the store and expires one hour after the session is created.

use super::{database::DatabaseSessionStore, StoreError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use gatehouse_core::SessionData;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Session lifetime, also used as the cookie max age
pub const SESSION_TTL_SECS: i64 = 60 * 60;

const SESSION_ID_BYTES: usize = 32;

/// A stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// New session with a fresh random id and a full TTL
    pub fn new(data: SessionData) -> Self {
        Self {
            id: generate_session_id(),
            data,
            expires_at: Utc::now() + Duration::seconds(SESSION_TTL_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 256 random bits, URL-safe base64
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Session store supporting both in-memory and database storage
#[derive(Debug, Clone)]
pub enum SessionStore {
    /// In-memory storage (development and tests)
    Memory {
        sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    },
    /// SQLite storage
    Database(DatabaseSessionStore),
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl SessionStore {
    pub fn memory() -> Self {
        Self::Memory {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn database(store: DatabaseSessionStore) -> Self {
        Self::Database(store)
    }

    /// Persist a new session holding `data`
    pub async fn create(&self, data: SessionData) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord::new(data);

        match self {
            Self::Memory { sessions } => {
                sessions
                    .write()
                    .await
                    .insert(record.id.clone(), record.clone());
            }
            Self::Database(db) => db.save(&record).await?,
        }

        debug!("Session created, expires at {}", record.expires_at);
        Ok(record)
    }

    /// Fetch a live session. Expired sessions read as `None`.
    pub async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match self {
            Self::Memory { sessions } => {
                let now = Utc::now();
                let record = sessions.read().await.get(id).cloned();
                match record {
                    Some(record) if record.is_expired(now) => {
                        sessions.write().await.remove(id);
                        Ok(None)
                    }
                    other => Ok(other),
                }
            }
            Self::Database(db) => db.load(id).await,
        }
    }

    /// Remove a session. Removing an unknown id is not an error.
    pub async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory { sessions } => {
                sessions.write().await.remove(id);
                Ok(())
            }
            Self::Database(db) => db.destroy(id).await,
        }
    }

    /// Delete every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        match self {
            Self::Memory { sessions } => {
                let now = Utc::now();
                let mut sessions = sessions.write().await;
                let before = sessions.len();
                sessions.retain(|_, record| !record.is_expired(now));
                Ok((before - sessions.len()) as u64)
            }
            Self::Database(db) => db.purge_expired().await,
        }
    }
}
