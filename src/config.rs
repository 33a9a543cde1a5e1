use crate::transformer::Transformer;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILTER: &str = "postview=info,tower_http=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the server binds to.
    pub listen_address: String,
    pub store: StoreConfig,
    /// Origin allowed to call the procedure endpoint cross-site.
    pub cors_origin: Option<String>,
    /// Must match between the server and any client reading its pages.
    pub transformer: Transformer,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: crate::blog::LISTEN_ADDRESS.to_owned(),
            store: StoreConfig::default(),
            cors_origin: None,
            transformer: Transformer::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from(crate::blog::STORE_PATH),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid listen_address {0:?}")]
    ListenAddress(String),
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents)?;

        if config.listen_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ListenAddress(config.listen_address));
        }

        Ok(config)
    }
}

pub async fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Config::from_toml(&contents)
}
