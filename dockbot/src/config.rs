//! Static configuration, loaded once at startup.

use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::discord::SignatureVerifier;
use crate::error::ConfigError;
use crate::policy::AuthorizationPolicy;

/// Contents of `config/config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot token for the REST API and the gateway.
    pub token: String,
    pub application_id: u64,
    /// Hex-encoded ed25519 key used to verify interaction requests.
    pub public_key: String,
    #[serde(default)]
    pub allowed_user_ids: Vec<u64>,
    /// Guilds to register the slash commands in. Empty registers globally.
    #[serde(default)]
    pub guild_ids: Vec<u64>,
    /// Hours east of UTC for footer timestamps.
    #[serde(default)]
    pub timezone_offset: f64,
    #[serde(default)]
    pub status: Option<StatusConfig>,
}

/// Presence shown next to the bot's name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StatusConfig {
    /// `playing`, `listening` or `watching`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        if !config.timezone_offset.is_finite() || config.timezone_offset.abs() >= 24.0 {
            return Err(ConfigError::TimezoneOffset(config.timezone_offset));
        }
        config.verifier()?;
        Ok(config)
    }

    pub fn verifier(&self) -> Result<SignatureVerifier, ConfigError> {
        Ok(SignatureVerifier::from_hex(&self.public_key)?)
    }

    pub fn policy(&self) -> AuthorizationPolicy {
        AuthorizationPolicy::new(self.allowed_user_ids.iter().copied())
    }

    pub fn utc_offset(&self) -> FixedOffset {
        let secs = (self.timezone_offset * 3600.0).round() as i32;
        FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
    }
}
