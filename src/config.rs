use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_WEBHOOK_URL: &str = "https://hook.eu2.make.com/5naam9qq4wr6ttvesd9cn3sdzvxaxu3d";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_USERS_PATH: &str = "config/users.json";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub users_path: PathBuf,
    pub webhook_url: String,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let users_path = lookup("APP_USERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_USERS_PATH));

        let webhook_url = lookup("PNL_WEBHOOK_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());

        let fetch_timeout = match lookup("PNL_FETCH_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PNL_FETCH_TIMEOUT_SECS",
                        value,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            users_path,
            webhook_url,
            fetch_timeout,
        })
    }
}
