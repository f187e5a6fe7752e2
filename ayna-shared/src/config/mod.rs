//! # Configuration
//!
//! Client settings shared by the browser app and the terminal client.

mod client;

pub use client::{
    API_URL_ENV, ClientConfig, ConfigError, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_RELAY_URL, LOG_LEVEL_ENV, RELAY_URL_ENV,
};
