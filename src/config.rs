//! Environment-driven configuration.
//!
//! Values come from the process environment, after loading a `.env` file
//! from the working directory if there is one.

use std::path::PathBuf;
use std::time::Duration;

pub(crate) const STORE_URL: &str = "SPENDWISE_STORE_URL";
pub(crate) const STORE_KEY: &str = "SPENDWISE_STORE_KEY";
pub(crate) const USER_ID: &str = "SPENDWISE_USER_ID";
pub(crate) const TIMEOUT_SECS: &str = "SPENDWISE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported store URL '{0}', expected https://... or sqlite:<path>")]
    UnsupportedUrl(String),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("could not determine data directory")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) store_url: String,
    pub(crate) store_key: String,
    pub(crate) user_id: Option<String>,
    pub(crate) timeout: Duration,
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Backend {
    Rest {
        url: String,
        key: String,
        timeout: Duration,
    },
    Sqlite(PathBuf),
    /// Reads come back empty and writes are refused.
    Unconfigured,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let timeout_raw = read(TIMEOUT_SECS);
        let timeout_secs = if timeout_raw.is_empty() {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    key: TIMEOUT_SECS,
                    value: timeout_raw.clone(),
                })?
        };

        let user_id = read(USER_ID);
        Ok(Self {
            store_url: read(STORE_URL),
            store_key: read(STORE_KEY),
            user_id: (!user_id.is_empty()).then_some(user_id),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub(crate) fn backend(&self) -> Result<Backend, ConfigError> {
        let url = self.store_url.as_str();
        if let Some(path) = url.strip_prefix("sqlite:") {
            let path = if path.is_empty() {
                default_db_path()?
            } else {
                PathBuf::from(path)
            };
            return Ok(Backend::Sqlite(path));
        }
        if url.is_empty() || self.store_key.is_empty() {
            return Ok(Backend::Unconfigured);
        }
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(Backend::Rest {
                url: url.to_string(),
                key: self.store_key.clone(),
                timeout: self.timeout,
            })
        } else {
            Err(ConfigError::UnsupportedUrl(url.to_string()))
        }
    }
}

/// `spendwise.db` in the per-user data directory.
pub(crate) fn default_db_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("com", "spendwise", "Spendwise")
        .ok_or(ConfigError::NoDataDir)?;
    Ok(proj_dirs.data_dir().join("spendwise.db"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
