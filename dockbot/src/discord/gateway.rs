//! Gateway session for presence.
//!
//! Interactions arrive over HTTP, so the gateway connection exists only to
//! show the bot online with its configured activity. No intents are
//! requested and dispatch events other than READY are ignored.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::DiscordError;
use crate::config::StatusConfig;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// Activity shown under the bot's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl Activity {
    /// `playing`, `listening` and `watching` map to activity types; anything
    /// else shows no activity.
    pub fn from_status(status: &StatusConfig) -> Option<Self> {
        let kind = match status.kind.as_str() {
            "playing" => 0,
            "listening" => 2,
            "watching" => 3,
            _ => return None,
        };
        Some(Activity {
            name: status.message.clone(),
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

pub fn identify_payload(token: &str, activity: Option<&Activity>) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": 0,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "dockbot",
                "device": "dockbot"
            },
            "presence": {
                "since": null,
                "activities": activity.into_iter().collect::<Vec<_>>(),
                "status": "online",
                "afk": false
            }
        }
    })
}

pub fn heartbeat_payload(sequence: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": sequence })
}

/// Keep a gateway session alive forever, reconnecting after failures.
pub async fn run_presence(token: String, activity: Option<Activity>) {
    loop {
        match session(&token, activity.as_ref()).await {
            Ok(()) => info!("Gateway asked to reconnect"),
            Err(e) => error!("Gateway error: {}. Reconnecting in 5 seconds...", e),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Heartbeat period announced in HELLO. Zero is rejected.
fn heartbeat_interval(hello: &GatewayPayload) -> Result<Duration, DiscordError> {
    match hello.d.get("heartbeat_interval").and_then(Value::as_u64) {
        Some(0) => Err(DiscordError::Gateway("hello with zero heartbeat_interval".to_string())),
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Err(DiscordError::Gateway("hello without heartbeat_interval".to_string())),
    }
}

async fn session(token: &str, activity: Option<&Activity>) -> Result<(), DiscordError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(GATEWAY_URL).await?;
    let (mut writer, mut reader) = ws_stream.split();

    let hello = match reader.next().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<GatewayPayload>(&text)?,
        Some(Ok(other)) => {
            return Err(DiscordError::Gateway(format!("unexpected frame: {:?}", other)));
        }
        Some(Err(e)) => return Err(e.into()),
        None => return Err(DiscordError::Gateway("closed before hello".to_string())),
    };
    if hello.op != OP_HELLO {
        return Err(DiscordError::Gateway(format!("expected hello, got op {}", hello.op)));
    }
    let interval = heartbeat_interval(&hello)?;

    writer
        .send(Message::Text(identify_payload(token, activity).to_string().into()))
        .await?;

    let mut heartbeat = tokio::time::interval(interval);
    // The first tick completes immediately.
    heartbeat.tick().await;
    let mut sequence: Option<u64> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                writer
                    .send(Message::Text(heartbeat_payload(sequence).to_string().into()))
                    .await?;
            }
            frame = reader.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => {
                        return Err(DiscordError::Gateway(format!("closed: {:?}", frame)));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(DiscordError::Gateway("stream ended".to_string())),
                };

                let payload: GatewayPayload = serde_json::from_str(&text)?;
                if payload.s.is_some() {
                    sequence = payload.s;
                }

                match payload.op {
                    OP_DISPATCH if payload.t.as_deref() == Some("READY") => info!("Bot online!"),
                    OP_DISPATCH => {}
                    OP_HEARTBEAT => {
                        writer
                            .send(Message::Text(heartbeat_payload(sequence).to_string().into()))
                            .await?;
                    }
                    OP_HEARTBEAT_ACK => debug!("Heartbeat acknowledged"),
                    OP_RECONNECT | OP_INVALID_SESSION => return Ok(()),
                    op => warn!(op = op, "Unhandled gateway opcode"),
                }
            }
        }
    }
}
