//! Staff Directory Admin Gate
//!
//! Serves the administrator login flow for the staff directory:
//! - Credential check against a single configured admin account
//! - Server-side sessions with sliding expiry and hijack detection
//! - Guarded admin routes, session-check and logout endpoints

use std::io::BufRead;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use directory_core::{credentials, AuthConfig};
use telemetry::{health, init_tracing_from_env};

#[derive(Parser)]
#[command(name = "staff-directory")]
#[command(about = "Staff directory admin gate: login, session validation, and logout")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a PBKDF2 hash for DIRECTORY__AUTH__ADMIN_PASSWORD_HASH.
    /// Reads the password from stdin when not given.
    HashPassword {
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_auth")]
    auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_auth() -> AuthConfig {
    AuthConfig::default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth: default_auth(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::HashPassword { password } => hash_password(password),
    }
}

async fn serve() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Staff Directory admin gate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    if let Err(e) = config.auth.validate() {
        health().auth_config.set_unhealthy(e.to_string());
        error!(error = %e, "Invalid admin auth configuration");
        return Err(e).context("Invalid admin auth configuration");
    }
    health().auth_config.set_healthy();

    info!(
        admin_username = %config.auth.admin_username,
        session_lifetime_secs = config.auth.session_lifetime_secs,
        session_update_interval_secs = config.auth.session_update_interval_secs,
        cookie_secure = ?config.auth.cookie_secure,
        "Loaded admin auth config"
    );

    let state = AppState::in_memory(config.auth.clone());
    if state.gate.store().is_healthy() {
        health().session_store.set_healthy();
    } else {
        health().session_store.set_unhealthy("Session store not responding");
        warn!("Session store unhealthy at startup");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Prints the PHC hash for a password.
fn hash_password(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    let hash = credentials::hash_password(&password).context("Failed to hash password")?;
    println!("{hash}");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. DIRECTORY__AUTH__ADMIN_USERNAME
        .add_source(
            config::Environment::with_prefix("DIRECTORY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
