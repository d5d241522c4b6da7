//! Gatehouse Web Server
//!
//! Signup, login and a members-only page behind a signed session cookie.

use anyhow::Context;
use clap::Parser;
use gatehouse_core::{init_logging, LogFormat, LoggingConfig};
use gatehouse_web::server::GatehouseServerBuilder;
use gatehouse_web::WebConfig;
use tracing::{info, warn};

/// Gatehouse Web Server - accounts and a members-only area
#[derive(Parser)]
#[command(name = "gatehouse-web")]
#[command(about = "Signup, login and a members-only page")]
#[command(version)]
struct Args {
    /// Server host to bind to [env: GATEHOUSE_HOST]
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on [env: GATEHOUSE_PORT]
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL for user records [env: DATABASE_URL]
    #[arg(long)]
    database_url: Option<String>,

    /// Database URL for sessions, defaults to the user database [env: SESSION_DATABASE_URL]
    #[arg(long)]
    session_database_url: Option<String>,

    /// Static files directory [env: GATEHOUSE_STATIC_DIR]
    #[arg(long)]
    static_dir: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (compact, pretty, json)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

impl Args {
    /// Command-line flags win over the environment
    fn apply(self, mut config: WebConfig) -> WebConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.database_url {
            config.database_url = Some(url);
        }
        if let Some(url) = self.session_database_url {
            config.session_database_url = Some(url);
        }
        if let Some(dir) = self.static_dir {
            config.static_dir = dir;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let logging = LoggingConfig {
        format: args.log_format,
        ..LoggingConfig::with_level(&args.log_level)
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = args.apply(WebConfig::from_env());

    info!("Starting Gatehouse Web Server");
    info!("Address: http://{}", config.address());
    match &config.database_url {
        Some(url) => info!("Database: {}", url),
        None => warn!("DATABASE_URL not set, accounts and sessions are kept in memory"),
    }

    let server = GatehouseServerBuilder::from_config(config)
        .build()
        .await
        .context("failed to build server")?;

    server.start().await.context("server stopped with an error")?;

    info!("Server shut down");
    Ok(())
}
