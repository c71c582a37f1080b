//! Reply rendering.
//!
//! Pure functions over captured engine output; nothing here runs a process.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::command::{ContainerAction, ImageAction};

/// Discord "blurple".
pub const EMBED_COLOR: u32 = 0x5865F2;

pub const PONG: &str = "`\u{1F3D3} Pong!`";
pub const INVALID_IMAGE_NAME: &str = "Please provide a valid image name.";
pub const PRUNED: &str = "Unused Docker images have been pruned.";
pub const NO_IMAGES: &str = "No images found.";
pub const UPTIME_UNSUPPORTED: &str = "System uptime command not supported.";

pub const TITLE_CONTAINERS: &str = "**__Docker Management__**";
pub const TITLE_IMAGES: &str = "**__Docker Image Management__**";
pub const TITLE_PRUNE: &str = "**__Docker Image Pruning__**";
pub const TITLE_STATUS: &str = "**__Docker Container(s) Status__**";
pub const TITLE_UPTIME: &str = "**__System Uptime__**";

pub const FIELD_ONLINE: &str = ":green_circle: **__Online__**";
pub const FIELD_OFFLINE: &str = ":red_circle: **__Offline__**";

const FOOTER_FORMAT: &str = "%I:%M %p - %d/%m/%Y";

// Discord rejects messages exceeding these.
pub(crate) const MAX_CONTENT: usize = 2000;
const MAX_DESCRIPTION: usize = 4096;
const MAX_FIELD_VALUE: usize = 1024;

/// What gets sent back to the invoking channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Text content, if this is a plain reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Reply::Embed(embed) => Some(embed),
            Reply::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            color: EMBED_COLOR,
            fields: Vec::new(),
            footer: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate(&description.into(), MAX_DESCRIPTION));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: truncate(&value.into(), MAX_FIELD_VALUE),
            inline: false,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    /// Everything a reader sees, for assertions and logs.
    pub fn plain_text(&self) -> String {
        let mut out = self.title.clone();
        if let Some(description) = &self.description {
            out.push('\n');
            out.push_str(description);
        }
        for field in &self.fields {
            out.push('\n');
            out.push_str(&field.name);
            out.push('\n');
            out.push_str(&field.value);
        }
        out
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Footer timestamp, e.g. `03:07 PM - 14/10/2026`.
pub fn footer_time(now: DateTime<FixedOffset>) -> String {
    now.format(FOOTER_FORMAT).to_string()
}

// === Containers ===

pub fn container_done(name: &str, action: ContainerAction) -> String {
    format!("Container `{}` has been {}.", name, action.past_tense())
}

pub fn still_running(name: &str) -> String {
    format!(
        "Container `{}` is still running. Please stop it before deleting.",
        name
    )
}

/// One row of `docker ps --format '{{.Names}}\t{{.Status}}'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRow {
    pub name: String,
    pub status: String,
}

impl ContainerRow {
    pub fn is_online(&self) -> bool {
        self.status.contains("Up")
    }

    fn display(&self) -> String {
        format!("**{}**: `{}`", self.name, self.status)
    }
}

pub fn parse_containers(output: &str) -> Vec<ContainerRow> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (name, status) = line.split_once('\t').unwrap_or((line, ""));
            ContainerRow {
                name: name.to_string(),
                status: status.trim_end().to_string(),
            }
        })
        .collect()
}

/// Online and offline containers as separate fields; empty groups are omitted.
pub fn container_status(rows: &[ContainerRow]) -> Embed {
    let (online, offline): (Vec<_>, Vec<_>) = rows.iter().partition(|row| row.is_online());

    let mut embed = Embed::new(TITLE_STATUS);
    if !online.is_empty() {
        embed = embed.field(FIELD_ONLINE, join_rows(&online));
    }
    if !offline.is_empty() {
        embed = embed.field(FIELD_OFFLINE, join_rows(&offline));
    }
    embed
}

fn join_rows(rows: &[&ContainerRow]) -> String {
    rows.iter()
        .map(|row| row.display())
        .collect::<Vec<_>>()
        .join("\n")
}

// === Images ===

pub fn image_done(name: &str, action: ImageAction) -> String {
    let verb = match action {
        ImageAction::Pull => "pulled",
        ImageAction::Remove => "removed",
        ImageAction::List => "listed",
    };
    format!("Image `{}` has been {}.", name, verb)
}

/// Renders `docker images --format '{{.Repository}}:{{.Tag}}\t{{.Size}}'`.
pub fn image_list(output: &str) -> String {
    let lines: Vec<String> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (image, size) = line.split_once('\t').unwrap_or((line, ""));
            format!("**{}** - Size: {}", image, size.trim_end())
        })
        .collect();

    if lines.is_empty() {
        NO_IMAGES.to_string()
    } else {
        lines.join("\n")
    }
}

// === Host ===

pub fn uptime(text: &str) -> Embed {
    Embed::new(TITLE_UPTIME).description(format!("**Uptime:** `{}`", text.trim()))
}
