use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use server::auth::hash_password;
use server::{AppState, build_service, database};
use shared::config::load_config;

const DB_POOL_SIZE: u32 = 8;

#[derive(Debug, Parser)]
#[command(name = "soundfront", version, about = "soundfront site and admin backend")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SOUNDFRONT_CONFIG", default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Print an Argon2 hash for `auth.admin_password_hash` / ADMIN_PASSWORD_HASH
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
            Ok(())
        }
        Command::Serve => serve(&cli.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let db_url = config.paths.resolved_database_url();
    let db = database::connect(&db_url, DB_POOL_SIZE)
        .await
        .with_context(|| format!("Failed to open database {}", db_url))?;
    database::create_tables(&db)
        .await
        .context("Failed to create database schema")?;

    let addr = config.server.addr();
    let max_connections = config.server.max_connections;
    let state = AppState::new(config, db)?;

    info!(
        "Protecting {} (login: {}, unauthorized: {})",
        state.config.gate.protected_prefix,
        state.config.gate.login_path,
        state.config.gate.unauthorized_path
    );

    let service = build_service::<Incoming>(state);
    let limiter = Arc::new(Semaphore::new(max_connections));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let permit = match limiter.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("Connection limit ({}) reached, dropping {}", max_connections, peer);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let svc = TowerToHyperService::new(service.clone());

                tokio::task::spawn(async move {
                    let _permit = permit;
                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    info!("Server stopped");
    Ok(())
}
