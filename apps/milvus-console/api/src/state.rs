//! Shared application state.

use std::sync::Arc;

use domain_milvus::{MilvusRestClient, MilvusService};

use crate::config::Config;

/// The console talks to exactly one Milvus deployment; its client is built
/// once here and shared by every handler through the service.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub milvus: Arc<MilvusService<MilvusRestClient>>,
}

impl AppState {
    pub fn new(config: Config) -> eyre::Result<Self> {
        let client = MilvusRestClient::new(&config.milvus)
            .map_err(|e| eyre::eyre!("Failed to build Milvus client: {}", e))?;
        let milvus = Arc::new(MilvusService::with_options(client, config.facade));

        Ok(Self { config, milvus })
    }
}
