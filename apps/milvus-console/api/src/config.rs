use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_milvus::{FacadeOptions, MilvusConfig};

pub use core_config::Environment;

/// Application configuration, composed from the shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub milvus: MilvusConfig,
    pub facade: FacadeOptions,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let milvus = MilvusConfig::from_env()?; // MILVUS_HOST=localhost, MILVUS_PORT=19530
        let facade = FacadeOptions::from_env()?;

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            milvus,
            facade,
        })
    }
}
