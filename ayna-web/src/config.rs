//! Build-time configuration for the browser app.
//!
//! Trunk forwards `AYNA_*` variables at compile time; anything unset falls
//! back to the shared client defaults.

use shared::config::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_RELAY_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    inner: ClientConfig,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            inner: ClientConfig {
                api_base_url: option_env!("AYNA_API_URL")
                    .unwrap_or(DEFAULT_API_BASE_URL)
                    .to_string(),
                relay_url: option_env!("AYNA_RELAY_URL")
                    .unwrap_or(DEFAULT_RELAY_URL)
                    .to_string(),
                log_level: option_env!("AYNA_LOG_LEVEL")
                    .unwrap_or(DEFAULT_LOG_LEVEL)
                    .to_string(),
            },
        }
    }
}

impl FrontendConfig {
    pub fn new() -> Self {
        let config = Self::default();
        if let Err(err) = config.inner.validate() {
            log::warn!("build configuration rejected ({err}); using defaults");
            return Self {
                inner: ClientConfig::with_defaults(),
            };
        }
        config
    }

    pub fn api_base_url(&self) -> &str {
        &self.inner.api_base_url
    }

    pub fn relay_url(&self) -> &str {
        &self.inner.relay_url
    }

    pub fn log_level(&self) -> &str {
        &self.inner.log_level
    }
}
