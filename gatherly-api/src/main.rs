//! # Gatherly API Server
//!
//! REST API for the Gatherly event platform, built with Axum over
//! PostgreSQL.
//!
//! ## Architecture
//!
//! - Account and session management (opaque tokens in `X-Authorization`)
//! - Event CRUD, attendee registration and search
//! - Questions with one-vote-per-user tallies
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo run -p gatherly-api
//! ```

use gatherly_api::{
    app::{build_router, AppState},
    config::Config,
};
use gatherly_shared::db::{migrations::run_migrations, pool::create_pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatherly_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Gatherly API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.database_config()).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready, migrations applied");

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
