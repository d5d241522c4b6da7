//! Gatehouse Web Server
//!
//! Signup, login, logout, and a members page gated on a server-side session.

pub mod auth;
pub mod database;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

// Re-export main types
pub use server::GatehouseServer;
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    routes::app_routes(&state.config.static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Shortest accepted session secret, in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// User database URL; `None` keeps everything in memory
    pub database_url: Option<String>,
    /// Session database URL; defaults to the user database
    pub session_database_url: Option<String>,
    /// Secret the session cookie is signed with
    pub session_secret: Option<String>,
    /// Directory served for unmatched GET requests
    pub static_dir: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            session_database_url: None,
            session_secret: None,
            static_dir: "public".to_string(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("GATEHOUSE_HOST").unwrap_or(defaults.host),
            port: std::env::var("GATEHOUSE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: non_empty_var("DATABASE_URL"),
            session_database_url: non_empty_var("SESSION_DATABASE_URL"),
            session_secret: non_empty_var("SESSION_SECRET"),
            static_dir: std::env::var("GATEHOUSE_STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Effective session database URL
    pub fn session_database_url(&self) -> Option<&str> {
        self.session_database_url
            .as_deref()
            .or(self.database_url.as_deref())
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> WebResult<()> {
        if self.host.trim().is_empty() {
            return Err(WebError::Config("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(WebError::Config("port cannot be 0".to_string()));
        }
        if let Some(secret) = &self.session_secret {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(WebError::Config(format!(
                    "session secret must be at least {} bytes",
                    MIN_SECRET_LENGTH
                )));
            }
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Store(#[from] auth::StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
