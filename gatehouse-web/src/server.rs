//! Gatehouse Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// How often expired sessions are swept from the store
pub const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Main Gatehouse web server
pub struct GatehouseServer {
    config: WebConfig,
    state: AppState,
}

impl GatehouseServer {
    /// Create a new server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        config.validate()?;
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Bind the configured address and serve until the process stops
    pub async fn start(self) -> WebResult<()> {
        let listener = TcpListener::bind(self.config.address())
            .await
            .map_err(WebError::Server)?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> WebResult<()> {
        let address = listener.local_addr().map_err(WebError::Server)?;
        let app = create_app(self.state.clone());

        let purge_state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                purge_state.purge_expired_sessions().await;
            }
        });

        info!("Server is running on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }
}

/// Builder for GatehouseServer
pub struct GatehouseServerBuilder {
    config: WebConfig,
}

impl GatehouseServerBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: WebConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    pub fn session_database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.session_database_url = Some(database_url.into());
        self
    }

    pub fn session_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.session_secret = Some(secret.into());
        self
    }

    pub fn static_dir<S: Into<String>>(mut self, static_dir: S) -> Self {
        self.config.static_dir = static_dir.into();
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<GatehouseServer> {
        GatehouseServer::new(self.config).await
    }
}

impl Default for GatehouseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
