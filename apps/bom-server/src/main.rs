mod routes;

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bom_app::{AppConfig, AppContext, build_generator, open_store, seed_if_empty};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = env::var_os("BOM_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    let addr: SocketAddr = config.server.bind.parse()?;

    let store = open_store(&config)?;
    if let Some(summary) = seed_if_empty(&store, &config.seed_path)? {
        info!(
            models = summary.models,
            options = summary.options,
            requirements = summary.requirements,
            "seeded empty database"
        );
    }
    let generator = build_generator(&config.ai)?;
    let ctx = Arc::new(AppContext::new(Arc::new(store), generator, config));

    let app = routes::router(ctx);
    info!(%addr, "bom-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
