//! taskgridd — the TaskGrid daemon.
//!
//! Single binary that assembles the subsystems:
//! - Registry (redb)
//! - Scheduling engine
//! - REST API
//!
//! # Usage
//!
//! ```text
//! taskgridd standalone --port 8443 --data-dir /var/lib/taskgrid
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "taskgridd", about = "TaskGrid daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run in standalone mode (registry, engine, and API in one process).
    Standalone {
        /// Port to listen on.
        #[arg(long, default_value = "8443")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/taskgrid")]
        data_dir: PathBuf,

        /// Reject completions whose VM does not match the task's
        /// recorded assignment.
        #[arg(long)]
        strict_completion: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taskgridd=debug,taskgrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            port,
            data_dir,
            strict_completion,
        } => run_standalone(port, data_dir, strict_completion).await,
    }
}

async fn run_standalone(
    port: u16,
    data_dir: PathBuf,
    strict_completion: bool,
) -> anyhow::Result<()> {
    info!("TaskGrid daemon starting in standalone mode");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("taskgrid.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let state = taskgrid_state::Registry::open(&db_path)?;
    info!(path = ?db_path, "registry opened");

    let engine = taskgrid_scheduler::Engine::with_config(
        state.clone(),
        taskgrid_scheduler::EngineConfig { strict_completion },
    );
    info!(strict_completion, "engine initialized");

    // ── Start API server ───────────────────────────────────────

    let router = taskgrid_api::build_router(state, engine);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("TaskGrid daemon stopped");
    Ok(())
}
