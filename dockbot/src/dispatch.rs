//! Command dispatch.
//!
//! Each request goes through the same steps: authorization gate, one or two
//! engine invocations, then rendering of the captured output.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::{info, warn};

use crate::command::{Command, CommandRequest, ContainerAction, ImageAction};
use crate::engine::{CommandRunner, DockerCli};
use crate::error::{DispatchError, Result};
use crate::format::{self, Embed, Reply};
use crate::policy::AuthorizationPolicy;

/// Discord shows at most this many autocomplete choices.
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

/// Host platform, for picking the uptime command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Unsupported,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            _ => Platform::Unsupported,
        }
    }

    fn uptime_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Platform::Linux => Some(&["-p"]),
            Platform::MacOs => Some(&[]),
            Platform::Unsupported => None,
        }
    }
}

pub struct Dispatcher {
    docker: DockerCli,
    runner: Arc<dyn CommandRunner>,
    policy: AuthorizationPolicy,
    offset: FixedOffset,
    platform: Platform,
}

impl Dispatcher {
    pub fn new(
        docker_binary: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
        policy: AuthorizationPolicy,
        offset: FixedOffset,
    ) -> Self {
        Self {
            docker: DockerCli::new(docker_binary, Arc::clone(&runner)),
            runner,
            policy,
            offset,
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Whether the request would pass the authorization gate.
    pub fn is_authorized(&self, request: &CommandRequest) -> bool {
        !request.command.is_privileged() || self.policy.allows(request.user_id)
    }

    /// Run a request and render its outcome. Never fails: errors become text.
    pub async fn dispatch(&self, request: CommandRequest) -> Reply {
        match self.execute(&request).await {
            Ok(reply) => reply,
            Err(e @ DispatchError::AuthorizationDenied) => Reply::text(e.to_string()),
            Err(DispatchError::ExternalCommandFailed(text)) => {
                warn!(user = request.user_id, error = %text, "Command failed");
                Reply::text(format!("{}: {}", request.command.failure_prefix(), text))
            }
        }
    }

    pub async fn execute(&self, request: &CommandRequest) -> Result<Reply> {
        if !self.is_authorized(request) {
            warn!(user = request.user_id, "Rejected unauthorized user");
            return Err(DispatchError::AuthorizationDenied);
        }

        match &request.command {
            Command::Container {
                action,
                name,
                context,
            } => self.container(*action, name, context).await,
            Command::Image {
                action,
                name,
                context,
            } => self.image(*action, name.as_deref(), context).await,
            Command::Prune { all, context } => {
                self.docker.prune_images(context, *all).await?;
                Ok(self.embed(Embed::new(format::TITLE_PRUNE).description(format::PRUNED)))
            }
            Command::List { context } => {
                let output = self.docker.list_containers(context).await?;
                let rows = format::parse_containers(&output);
                Ok(self.embed(format::container_status(&rows)))
            }
            Command::Ping => Ok(Reply::text(format::PONG)),
            Command::Uptime => self.uptime().await,
        }
    }

    async fn container(&self, action: ContainerAction, name: &str, context: &str) -> Result<Reply> {
        if action == ContainerAction::Delete {
            let status = self.docker.container_status(context, name).await?;
            // Only "running" blocks removal; paused or restarting containers are removed.
            if status == "running" {
                info!(container = %name, "Refusing to delete running container");
                return Ok(Reply::text(format::still_running(name)));
            }
        }

        self.docker.container_action(context, action, name).await?;
        Ok(self.embed(
            Embed::new(format::TITLE_CONTAINERS).description(format::container_done(name, action)),
        ))
    }

    async fn image(&self, action: ImageAction, name: Option<&str>, context: &str) -> Result<Reply> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let description = match (action, name) {
            (ImageAction::List, _) => format::image_list(&self.docker.list_images(context).await?),
            (ImageAction::Pull, Some(name)) => {
                self.docker.pull_image(context, name).await?;
                format::image_done(name, action)
            }
            (ImageAction::Remove, Some(name)) => {
                self.docker.remove_image(context, name).await?;
                format::image_done(name, action)
            }
            (ImageAction::Pull | ImageAction::Remove, None) => {
                return Ok(Reply::text(format::INVALID_IMAGE_NAME));
            }
        };

        Ok(self.embed(Embed::new(format::TITLE_IMAGES).description(description)))
    }

    async fn uptime(&self) -> Result<Reply> {
        let text = match self.platform.uptime_args() {
            Some(args) => {
                let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
                self.runner.run("uptime", &args).await?
            }
            None => format::UPTIME_UNSUPPORTED.to_string(),
        };
        Ok(self.embed(format::uptime(&text)))
    }

    /// Container names for the autocomplete popup.
    ///
    /// Failures and unauthorized users yield an empty list.
    pub async fn autocomplete_containers(
        &self,
        user_id: u64,
        context: &str,
        prefix: &str,
    ) -> Vec<String> {
        if !self.policy.allows(user_id) {
            return Vec::new();
        }

        let names = match self.docker.container_names(context).await {
            Ok(names) => names,
            Err(e) => {
                warn!(context = %context, error = %e, "Autocomplete lookup failed");
                return Vec::new();
            }
        };

        let prefix = prefix.to_lowercase();
        names
            .into_iter()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .take(MAX_AUTOCOMPLETE_CHOICES)
            .collect()
    }

    fn embed(&self, embed: Embed) -> Reply {
        let now = Utc::now().with_timezone(&self.offset);
        Reply::Embed(embed.footer(format::footer_time(now)))
    }
}
