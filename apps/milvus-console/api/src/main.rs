use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        milvus = %config.milvus.base_url(),
        nlist = config.facade.nlist,
        nprobe = config.facade.nprobe,
        "Configuring Milvus client"
    );
    let state = AppState::new(config)?;

    // Startup does not require Milvus; /ready reports it.
    match state.milvus.test_connection().await {
        Ok(()) => info!("Milvus reachable"),
        Err(e) => warn!(error = %e, "Milvus not reachable at startup"),
    }

    let api_routes = api::routes(state.milvus.clone());
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.milvus.clone()));

    info!("Starting Milvus console API (30s shutdown timeout)");

    let server = state.config.server;
    create_production_app(
        app,
        &server,
        Duration::from_secs(30),
        async move {
            // The HTTP client holds no server-side session; dropping it closes its pool.
            drop(state);
            info!("Milvus client released");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Milvus console API shutdown complete");
    Ok(())
}
