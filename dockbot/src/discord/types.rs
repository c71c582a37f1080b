//! Interaction wire types (Discord API v10).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::{self, Embed, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    Autocomplete,
    Other(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => InteractionType::Ping,
            2 => InteractionType::ApplicationCommand,
            4 => InteractionType::Autocomplete,
            other => InteractionType::Other(other),
        }
    }
}

/// Incoming interaction. Only the fields dockbot reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub data: Option<CommandData>,
    /// Set for guild invocations.
    #[serde(default)]
    pub member: Option<Member>,
    /// Set for DM invocations.
    #[serde(default)]
    pub user: Option<User>,
}

impl Interaction {
    /// Invoking user's snowflake.
    pub fn user_id(&self) -> Option<u64> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
            .and_then(|u| u.id.parse().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub focused: bool,
}

/// Body of an interaction response or a webhook message edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

impl From<Reply> for MessagePayload {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Text(text) => MessagePayload {
                content: Some(format::truncate(&text, format::MAX_CONTENT)),
                embeds: Vec::new(),
            },
            Reply::Embed(embed) => MessagePayload {
                content: None,
                embeds: vec![embed],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Message(MessagePayload),
    Choices { choices: Vec<AutocompleteChoice> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: 1, data: None }
    }

    pub fn message(reply: Reply) -> Self {
        Self {
            kind: 4,
            data: Some(ResponseData::Message(reply.into())),
        }
    }

    /// "Bot is thinking"; the real reply follows as an edit.
    pub fn deferred() -> Self {
        Self { kind: 5, data: None }
    }

    pub fn autocomplete(names: Vec<String>) -> Self {
        let choices = names
            .into_iter()
            .map(|name| AutocompleteChoice {
                value: name.clone(),
                name,
            })
            .collect();
        Self {
            kind: 8,
            data: Some(ResponseData::Choices { choices }),
        }
    }
}
