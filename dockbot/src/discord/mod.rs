//! Discord transport.
//!
//! - `types`: interaction payloads and responses
//! - `verify`: ed25519 request signature checks
//! - `commands`: slash command definitions and option parsing
//! - `rest`: REST v10 client (follow-ups, command registration)
//! - `gateway`: websocket session that keeps the presence up

pub mod commands;
pub mod gateway;
pub mod rest;
pub mod types;
pub mod verify;

use thiserror::Error;

pub use rest::DiscordClient;
pub use verify::SignatureVerifier;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for DiscordError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        DiscordError::Gateway(e.to_string())
    }
}
