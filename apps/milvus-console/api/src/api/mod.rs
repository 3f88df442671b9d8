use std::sync::Arc;

use axum::{Router, routing::get};
use domain_milvus::{MilvusClient, MilvusService, handlers};

pub mod health;

/// API routes without the `/api` prefix; `create_router` adds it.
pub fn routes<C: MilvusClient + 'static>(service: Arc<MilvusService<C>>) -> Router {
    Router::new().nest("/milvus", handlers::router(service))
}

/// `/ready`, probing Milvus through the shared client.
pub fn ready_router<C: MilvusClient + 'static>(service: Arc<MilvusService<C>>) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler::<C>))
        .with_state(service)
}
