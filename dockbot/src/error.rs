//! Error types for dockbot.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::discord::verify::VerifyError;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("timezone offset {0} is out of range (-24..24 hours)")]
    TimezoneOffset(f64),

    #[error("invalid public_key: {0}")]
    PublicKey(#[from] VerifyError),
}

/// Errors from running an external program.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The program could not be started at all.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program exited non-zero; carries its error output verbatim.
    #[error("{0}")]
    Failed(String),
}

/// The only two outcomes a dispatch can fail with.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("You are not authorized to use this bot.")]
    AuthorizationDenied,

    #[error("{0}")]
    ExternalCommandFailed(String),
}

impl From<EngineError> for DispatchError {
    fn from(e: EngineError) -> Self {
        DispatchError::ExternalCommandFailed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
