//! Gateway configuration types.
//!
//! [`GatewayConfig`] covers the HTTP surface. [`Settings`] gathers everything
//! the binary needs and is loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use heal_chat::{CompanionConfig, ResponderConfig};
use serde::Deserialize;
use thiserror::Error;

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Must exceed the responder timeout.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        64 * 1024
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Which responder the binary wires in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponderMode {
    /// Gemini when an API key is present, otherwise unconfigured.
    #[default]
    Gemini,
    /// Keyword-matched canned replies.
    Canned,
}

impl FromStr for ResponderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "canned" => Ok(Self::Canned),
            other => Err(ConfigError::Invalid {
                key: "RESPONDER_MODE",
                value: other.to_string(),
            }),
        }
    }
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed.
    #[error("invalid value for {key}: {value}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Everything the gateway binary needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP surface.
    pub gateway: GatewayConfig,
    /// RocksDB directory.
    pub data_dir: PathBuf,
    /// HMAC secret for bearer tokens. Required unless built with `dev-mode`.
    pub jwt_secret: String,
    /// Responder selection.
    pub responder_mode: ResponderMode,
    /// Remote responder settings.
    pub responder: ResponderConfig,
    /// Pipeline settings.
    pub companion: CompanionConfig,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup`, which returns a variable's value if set.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut gateway = GatewayConfig::default();
        if let Some(addr) = lookup("LISTEN_ADDR") {
            gateway.listen_addr = addr;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            gateway.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        let mut responder = ResponderConfig {
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()),
            ..ResponderConfig::default()
        };
        if let Some(model) = lookup("GEMINI_MODEL") {
            responder.model = model;
        }

        let responder_mode = lookup("RESPONDER_MODE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        let mut companion = CompanionConfig::default();
        if let Some(raw) = lookup("RESPONDER_TIMEOUT_SECS") {
            companion.responder_timeout_seconds =
                raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "RESPONDER_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
        }
        gateway.request_timeout_seconds = gateway
            .request_timeout_seconds
            .max(companion.responder_timeout_seconds.saturating_add(5));

        Ok(Self {
            gateway,
            data_dir: lookup("DATA_DIR")
                .map_or_else(|| PathBuf::from("/data/heal"), PathBuf::from),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_default(),
            responder_mode,
            responder,
            companion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/data/heal"));
        assert_eq!(settings.responder_mode, ResponderMode::Gemini);
        assert!(!settings.responder.is_configured());
        assert!(settings.jwt_secret.is_empty());
    }

    #[test]
    fn environment_overrides() {
        let settings = load(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("GEMINI_API_KEY", "key"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("RESPONDER_MODE", "Canned"),
            ("RESPONDER_TIMEOUT_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(settings.gateway.listen_addr, "127.0.0.1:9000");
        assert_eq!(settings.gateway.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(settings.responder.model, "gemini-pro");
        assert_eq!(settings.responder_mode, ResponderMode::Canned);
        assert_eq!(settings.companion.responder_timeout_seconds, 60);
        assert_eq!(settings.gateway.request_timeout_seconds, 65);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(load(&[("RESPONDER_MODE", "oracle")]).is_err());
        assert!(load(&[("RESPONDER_TIMEOUT_SECS", "soon")]).is_err());
    }
}
