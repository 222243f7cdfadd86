//! HTTP surface.
//!
//! All search routes live under `/api`; `/health` sits at the root.
//! `/api/search/all` requires a bearer token known to the configured
//! [`IdentityProvider`].

mod auth;
mod routes;
mod state;

pub use auth::{Caller, IdentityProvider, StaticTokenIdentity};
pub use routes::{router, ApiError};
pub use state::{AppState, StartupError};

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
