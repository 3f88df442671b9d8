use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

use crate::schema::DEFAULT_NLIST;

pub const DEFAULT_PORT: u16 = 19530;
pub const DEFAULT_NPROBE: u32 = 10;
pub const DEFAULT_SHARDS_NUM: u32 = 2;

/// Reported when a collection's vector dimension cannot be recovered.
pub const FALLBACK_DIMENSION: u32 = 128;

/// Milvus connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilvusConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub timeout_secs: u64,
}

impl MilvusConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            use_tls: false,
            timeout_secs: 30,
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// `user:password` token, only when both parts are present and non-empty.
    pub fn token(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(format!("{}:{}", user, password))
            }
            _ => None,
        }
    }
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl FromEnv for MilvusConfig {
    /// Reads MILVUS_HOST, MILVUS_PORT, MILVUS_USERNAME, MILVUS_PASSWORD,
    /// MILVUS_USE_TLS and MILVUS_TIMEOUT_SECS.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("MILVUS_HOST", "localhost"),
            port: env_parse("MILVUS_PORT", DEFAULT_PORT)?,
            username: env_optional("MILVUS_USERNAME"),
            password: env_optional("MILVUS_PASSWORD"),
            use_tls: env_parse("MILVUS_USE_TLS", false)?,
            timeout_secs: env_parse("MILVUS_TIMEOUT_SECS", 30)?,
        })
    }
}

/// Index, search and layout policy applied by the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    pub nlist: u32,
    pub nprobe: u32,
    pub shards_num: u32,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            nlist: DEFAULT_NLIST,
            nprobe: DEFAULT_NPROBE,
            shards_num: DEFAULT_SHARDS_NUM,
        }
    }
}

impl FromEnv for FacadeOptions {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            nlist: env_parse("MILVUS_INDEX_NLIST", DEFAULT_NLIST)?,
            nprobe: env_parse("MILVUS_SEARCH_NPROBE", DEFAULT_NPROBE)?,
            shards_num: env_parse("MILVUS_SHARDS_NUM", DEFAULT_SHARDS_NUM)?,
        })
    }
}
