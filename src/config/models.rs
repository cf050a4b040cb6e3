#[cfg(test)]
#[path = "models_test.rs"]
mod tests;

use std::sync::OnceLock;

use eyre::Result;
use serde::{Deserialize, Serialize};

use super::constants::{API_KEY_ENV, LOG_LEVEL};
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    /// Log to stderr when unset
    #[serde(default)]
    pub file: Option<LogFile>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendConfig {
    #[serde(default = "endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "model")]
    pub model: String,

    #[serde(default)]
    pub timeout_secs: Option<u16>,

    #[serde(default = "referer")]
    pub referer: Option<String>,

    #[serde(default = "app_title")]
    pub app_title: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStorage),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SqliteStorage {
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "listen_addr")]
    pub listen: String,
}

/// Process wide configuration, set once at start-up. Only consulted by
/// [`verbose!`](crate::verbose); everything else receives its section
/// explicitly.
static CONFIG: OnceLock<Configuration> = OnceLock::new();

impl Configuration {
    /// The configuration passed to [`Configuration::init`], or the defaults
    /// when it was never called.
    pub fn instance() -> &'static Configuration {
        CONFIG.get_or_init(Configuration::default)
    }

    pub fn init(config: Configuration) -> Result<()> {
        CONFIG
            .set(config)
            .map_err(|_| eyre::eyre!("Config already initialized"))?;
        Ok(())
    }
}

impl BackendConfig {
    /// The configured api key, or the `API_KEY` environment variable when
    /// the configuration leaves it empty.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs
            .map(|secs| std::time::Duration::from_secs(secs as u64))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some(LOG_LEVEL.to_string()),
            filters: None,
            file: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoint(),
            api_key: None,
            model: model(),
            timeout_secs: None,
            referer: referer(),
            app_title: app_title(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteStorage::default())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: listen_addr(),
        }
    }
}
