use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[cfg(not(target_arch = "wasm32"))]
use std::{env, fs, path::PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1337";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:1337";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const API_URL_ENV: &str = "AYNA_API_URL";
pub const RELAY_URL_ENV: &str = "AYNA_RELAY_URL";
pub const LOG_LEVEL_ENV: &str = "AYNA_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse configuration file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("unsupported configuration format `{0}`; use yaml, json or toml")]
    UnsupportedFormat(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where the client finds its backend and how loudly it logs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// REST backend root; `/api/...` is appended per request.
    pub api_base_url: String,

    /// Socket.IO relay root.
    pub relay_url: String,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values come from the file first. Environment variables only fill in
    /// values that are still at their default, and `api_override` wins over
    /// everything.
    ///
    /// # Errors
    /// Fails on unreadable or unparsable files, unknown extensions, and
    /// URLs that are not http(s).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_config(
        config_path: Option<PathBuf>,
        api_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => defaults.clone(),
        };

        if config.api_base_url == defaults.api_base_url {
            if let Ok(value) = env::var(API_URL_ENV) {
                config.api_base_url = value;
            }
        }
        if config.relay_url == defaults.relay_url {
            if let Ok(value) = env::var(RELAY_URL_ENV) {
                config.relay_url = value;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(value) = env::var(LOG_LEVEL_ENV) {
                config.log_level = value;
            }
        }

        if let Some(api) = api_override {
            config.api_base_url = api;
        }

        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let parse_error = |reason: String| ConfigError::Parse {
            path: display.clone(),
            reason,
        };
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("toml") => toml::from_str(&content).map_err(|err| parse_error(err.to_string())),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Checks both URLs and the log level.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("api_base_url", &self.api_base_url, &["http", "https"])?;
        check_url(
            "relay_url",
            &self.relay_url,
            &["http", "https", "ws", "wss"],
        )?;
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::Invalid {
        field,
        reason: format!("`{value}` is not a url ({err})"),
    })?;
    if schemes.contains(&url.scheme()) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        })
    }
}
