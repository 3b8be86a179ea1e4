// src/api/mod.rs
// =============================================================================
// This module is the HTTP surface of the service.
//
// Submodules:
// - routes: Router construction and the handlers
// - payload: Validation of the /load_urls body
// - error: ApiError and its JSON rendering
// =============================================================================

mod error;
mod payload;
mod routes;

pub use routes::{create_app, AppState};

use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

// Binds `addr` and serves until `shutdown` completes
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("listening on {}", addr);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    Ok(())
}
