use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use log::info;

use arenahub::auth::PgAuthProvider;
use arenahub::build_router;
use arenahub::core::config::AppConfig;
use arenahub::core::state::AppState;
use arenahub::drive::S3BlobStore;
use arenahub::store::pg::{create_pool, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("configuration")?;

    let pool = create_pool(&config.database).context("database pool")?;
    let store = Arc::new(PgStore::new(pool.clone()));
    let auth = Arc::new(PgAuthProvider::new(pool));
    let blob = Arc::new(
        S3BlobStore::init(&config.drive)
            .await
            .context("drive client")?,
    );

    let state = Arc::new(AppState::new(config, store, auth, blob));
    let shutdown = state.shutdown.clone();

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("arenahub listening on {addr}");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
            shutdown.cancel();
        })
        .await
        .context("server")?;

    Ok(())
}
