//! Application state shared by every handler

use crate::{
    auth::{
        database::{DatabaseSessionStore, DatabaseUserStore},
        sessions::SessionStore,
        users::{AccountService, UserStore},
    },
    database, WebConfig, WebResult,
};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rand::RngCore;
use sha2::{Digest, Sha512};
use sqlx::SqlitePool;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Signup and login over the credential store
    pub accounts: AccountService,
    /// Server-side sessions
    pub sessions: SessionStore,
    /// Key signing the session cookie
    cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Without a database URL both stores live in memory. The session store
    /// shares the user pool unless it is given its own URL.
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let user_pool = match &config.database_url {
            Some(url) => Some(database::connect(url).await?),
            None => None,
        };

        let users = match &user_pool {
            Some(pool) => UserStore::database(DatabaseUserStore::new(pool.clone()).await?),
            None => {
                warn!("No database configured, users are kept in memory");
                UserStore::memory()
            }
        };

        let session_pool: Option<SqlitePool> =
            match (config.session_database_url(), config.database_url.as_deref()) {
                (Some(session_url), Some(user_url)) if session_url == user_url => user_pool,
                (Some(session_url), _) => Some(database::connect(session_url).await?),
                (None, _) => None,
            };

        let sessions = match session_pool {
            Some(pool) => SessionStore::database(DatabaseSessionStore::new(pool).await?),
            None => SessionStore::memory(),
        };

        let cookie_key = match &config.session_secret {
            Some(secret) => derive_cookie_key(secret),
            None => {
                warn!("SESSION_SECRET not set, sessions will not survive a restart");
                random_cookie_key()
            }
        };

        info!("Application state initialized");
        Ok(Self {
            config,
            accounts: AccountService::new(users),
            sessions,
            cookie_key,
        })
    }

    pub fn cookie_key(&self) -> &Key {
        &self.cookie_key
    }

    /// Drop expired sessions; failures are logged and retried next round
    pub async fn purge_expired_sessions(&self) {
        match self.sessions.purge_expired().await {
            Ok(0) => {}
            Ok(count) => info!("Purged {} expired sessions", count),
            Err(e) => warn!("Failed to purge expired sessions: {}", e),
        }
    }
}

/// Stretch the configured secret to the 64 bytes the signing key needs
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

fn random_cookie_key() -> Key {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    Key::from(&bytes)
}
