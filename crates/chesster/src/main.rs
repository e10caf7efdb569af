//! chesster server binary.
//!
//! Run with: `cargo run --package chesster`

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chesster::auth::DevAuthenticator;
use chesster::rating::MemoryRatingStore;
use chesster::routes::{self, AppState};
use chesster::{Hub, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("chesster=info".parse()?))
        .init();

    let config = Arc::new(ServerConfig::from_env()?);
    config.validate()?;

    // Collaborator seams. A deployment swaps these for the real
    // account store and database.
    let store = Arc::new(MemoryRatingStore::new());
    let auth = Arc::new(DevAuthenticator);
    tracing::warn!("using the development authenticator; tokens are bare user ids");

    let (hub, _queue) = Hub::spawn(Arc::clone(&config), store);
    let state = AppState {
        hub,
        auth,
        config: Arc::clone(&config),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "chesster listening");
    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
