//! Parsed command invocations.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Context used when the invoker does not name one.
pub const DEFAULT_CONTEXT: &str = "default";

/// Container lifecycle actions accepted by `/docker execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
    Delete,
}

impl ContainerAction {
    pub const ALL: [ContainerAction; 6] = [
        ContainerAction::Start,
        ContainerAction::Stop,
        ContainerAction::Restart,
        ContainerAction::Pause,
        ContainerAction::Unpause,
        ContainerAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
            ContainerAction::Pause => "pause",
            ContainerAction::Unpause => "unpause",
            ContainerAction::Delete => "delete",
        }
    }

    /// The docker subcommand performing the action.
    pub fn subcommand(&self) -> &'static str {
        match self {
            ContainerAction::Delete => "rm",
            other => other.as_str(),
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ContainerAction::Start => "started",
            ContainerAction::Stop => "stopped",
            ContainerAction::Restart => "restarted",
            ContainerAction::Pause => "paused",
            ContainerAction::Unpause => "unpaused",
            ContainerAction::Delete => "deleted",
        }
    }
}

/// Image actions accepted by `/docker images`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    List,
    Pull,
    Remove,
}

impl ImageAction {
    pub const ALL: [ImageAction; 3] = [ImageAction::List, ImageAction::Pull, ImageAction::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageAction::List => "list",
            ImageAction::Pull => "pull",
            ImageAction::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ContainerAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

impl FromStr for ImageAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ImageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single slash command with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Container {
        action: ContainerAction,
        name: String,
        context: String,
    },
    Image {
        action: ImageAction,
        name: Option<String>,
        context: String,
    },
    Prune {
        all: bool,
        context: String,
    },
    List {
        context: String,
    },
    Ping,
    Uptime,
}

impl Command {
    /// Whether the command is gated by the authorization policy.
    pub fn is_privileged(&self) -> bool {
        match self {
            Command::Container { .. }
            | Command::Image { .. }
            | Command::Prune { .. }
            | Command::List { .. } => true,
            Command::Ping | Command::Uptime => false,
        }
    }

    /// Leading text of the reply when the external command fails.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Command::Container { .. } | Command::Image { .. } | Command::Prune { .. } => {
                "Error executing Docker command"
            }
            Command::List { .. } => "Error retrieving Docker containers",
            Command::Uptime => "Error retrieving system uptime",
            Command::Ping => "Error",
        }
    }
}

/// One invocation: what to do and who asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: Command,
    pub user_id: u64,
}

impl CommandRequest {
    pub fn new(command: Command, user_id: u64) -> Self {
        Self { command, user_id }
    }
}
