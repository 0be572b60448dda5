//! portal-access HTTP server
//!
//! Run with: cargo run --features server --bin portal-access-server
//!
//! Endpoints:
//!   GET  /health                 - Liveness and loaded generations
//!   PUT  /tree                   - Load a tree-fetch body
//!   PUT  /catalog                - Load a link-catalog body
//!   GET  /folders/:id/effective  - Effective grants for a folder
//!   GET  /files/:id/effective    - Effective grants for a file
//!   POST /check                  - Capabilities of a principal on a node
//!   POST /expand                 - Branches × departments to link ids
//!   POST /collapse               - Link ids to branches and departments

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use portal_access::server::{router, AppState};
use portal_access::AccessConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("PORTAL_ACCESS_CONFIG").unwrap_or_else(|_| "portal-access.toml".into());
    let config = AccessConfig::load_from(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let bind = config.server.bind.clone();
    let app = router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(%bind, "portal-access server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
