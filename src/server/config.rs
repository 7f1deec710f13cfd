use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::alerting::models::CooldownPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub log_dir: String,
    pub webhook_timeout_secs: u64,
    pub cooldown_policy: CooldownPolicy,
    pub auto_create_schema: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    pub database_url: Option<String>,
    pub listen_addr: Option<String>,
    pub log_dir: Option<String>,
    pub webhook_timeout_secs: Option<u64>,
    pub cooldown_policy: Option<String>,
    pub auto_create_schema: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

impl ServerConfig {
    /// Loads `.env`, then the optional TOML file, then the process
    /// environment. Environment values win over the file.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path) => Self::read_file(Path::new(path))?,
            None => PartialServerConfig::default(),
        };
        let env_config: PartialServerConfig = envy::from_env()?;

        Self::merge(env_config, file_config)
    }

    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn read_file(path: &Path) -> Result<PartialServerConfig, ConfigError> {
        if !path.exists() {
            return Ok(PartialServerConfig::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, ConfigError> {
        let cooldown_policy = match env_config.cooldown_policy.or(file_config.cooldown_policy) {
            Some(raw) => CooldownPolicy::parse(&raw).ok_or(ConfigError::Invalid {
                key: "COOLDOWN_POLICY",
                value: raw,
            })?,
            None => CooldownPolicy::default(),
        };
        let webhook_timeout_secs = env_config
            .webhook_timeout_secs
            .or(file_config.webhook_timeout_secs)
            .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS);
        if webhook_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "WEBHOOK_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            webhook_timeout_secs,
            cooldown_policy,
            auto_create_schema: env_config
                .auto_create_schema
                .or(file_config.auto_create_schema)
                .unwrap_or(true),
        })
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}
