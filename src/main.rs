//! Datascrub · data-cleaning exercise backend
//!
//! - Axum HTTP API: list challenges, serve a challenge's dirty records,
//!   grade a cleaned submission, keep a leaderboard
//! - SQLite (or in-memory) store, seeded with built-in exercises at startup
//! - Optional static SPA fallback (`static_dir`)
//!
//! Important env variables:
//!   APP_CONFIG_PATH : path to TOML config (server, store, seeding, challenge bank)
//!   PORT            : u16 (default 3000)
//!   DATABASE_PATH   : sqlite file (default "data.db")
//!   SEED_MODE       : "keep_existing" (default) or "reset"
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod record;
mod domain;
mod config;
mod error;
mod projector;
mod grader;
mod store;
mod seeds;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{load_config_from_env, ChallengeCfg};
use crate::routes::build_router;
use crate::seeds::{merge_bank, seed_challenges, seed_store};
use crate::state::AppState;
use crate::store::{open_store, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env();

  // Open the store and make sure it holds the exercises.
  let store = open_store(&cfg.store)?;
  let bank = cfg.challenges.iter().map(ChallengeCfg::to_challenge).collect();
  let challenges = merge_bank(seed_challenges(), bank);
  seed_store(store.as_ref(), cfg.seed_mode, &challenges)?;

  let state = Arc::new(AppState::new(store.clone(), &cfg));
  let app = build_router(state, cfg.static_dir.as_deref());

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "datascrub_backend", %addr, backend = ?cfg.store.backend, "HTTP server listening");

  let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

  // Release the store even if the server failed.
  match store.close() {
    Ok(()) => info!(target: "datascrub_backend", "Database connection closed"),
    Err(e) => error!(target: "datascrub_backend", error = %e, "Error closing database"),
  }
  served?;
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(target: "datascrub_backend", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        error!(target: "datascrub_backend", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "datascrub_backend", "Shutdown signal received");
}
