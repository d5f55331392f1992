//! Ambient runtime configuration shared by all three binaries: logging
//! knobs and the timing constants from §5 that aren't part of the wire
//! contract. Layered the way the teacher's `config::loader` is: defaults,
//! then an optional JSON file, with CLI flags (applied by each binary's
//! `main`) taking final precedence.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Explicit level, e.g. `"debug"`. Falls back to `RUST_LOG`, then `"info"`.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Text,
        }
    }
}

/// Non-wire timing knobs from §5 ("Cancellation/timeouts").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Lobby connect timeout for short-lived client connections (≈3s).
    #[serde(default = "defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Connect retry count for short-lived lobby connections (≈3).
    #[serde(default = "defaults::connect_retries")]
    pub connect_retries: u32,
    /// Polite-stop bound before a subprocess is force-killed (≈5s).
    #[serde(default = "defaults::stop_timeout_secs")]
    pub stop_timeout_secs: u64,
}

mod defaults {
    pub fn connect_timeout_secs() -> u64 {
        3
    }
    pub fn connect_retries() -> u32 {
        3
    }
    pub fn stop_timeout_secs() -> u64 {
        5
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            connect_timeout_secs: defaults::connect_timeout_secs(),
            connect_retries: defaults::connect_retries(),
            stop_timeout_secs: defaults::stop_timeout_secs(),
        }
    }
}

/// Loads `RuntimeConfig` from an optional JSON file, falling back to
/// defaults for anything the file omits or if the file is absent/unreadable.
pub fn load(path: Option<&Path>) -> RuntimeConfig {
    let Some(path) = path else {
        return RuntimeConfig::default();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file, using defaults");
            RuntimeConfig::default()
        }),
        Err(_) => RuntimeConfig::default(),
    }
}
