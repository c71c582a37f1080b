//! Container engine invocation.
//!
//! Every engine call is `[docker, --context=<context>, <subcommand>, ...]`.
//! Processes go through a [`CommandRunner`] so the dispatcher can be tested
//! without a docker daemon.

use std::process::{Output, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::ContainerAction;
use crate::error::EngineError;

/// Runs an external program and returns its captured stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, EngineError>;
}

/// Runs programs as child processes on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, EngineError> {
        debug!(program = %program, args = %args.join(" "), "Executing");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Failed(failure_text(&output)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Error text of a failed process: stderr, else stdout, else the exit status.
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    format!("command exited with {}", output.status)
}

/// Builds and runs docker CLI invocations.
pub struct DockerCli {
    binary: String,
    runner: Arc<dyn CommandRunner>,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    /// Argument vector for one invocation, without the binary itself.
    pub fn args(context: &str, subcommand: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(subcommand.len() + 1);
        args.push(format!("--context={}", context));
        args.extend(subcommand.iter().map(|s| s.to_string()));
        args
    }

    async fn run(&self, context: &str, subcommand: &[&str]) -> Result<String, EngineError> {
        self.runner
            .run(&self.binary, &Self::args(context, subcommand))
            .await
    }

    // === Containers ===

    /// Run a lifecycle action that maps one-to-one onto a docker subcommand.
    ///
    /// `Delete` maps to `rm`; callers are expected to check the running
    /// state first.
    pub async fn container_action(
        &self,
        context: &str,
        action: ContainerAction,
        name: &str,
    ) -> Result<(), EngineError> {
        info!(context = %context, container = %name, action = %action, "Container action");
        self.run(context, &[action.subcommand(), name]).await?;
        Ok(())
    }

    /// Current `.State.Status` of a container (`running`, `exited`, ...).
    pub async fn container_status(&self, context: &str, name: &str) -> Result<String, EngineError> {
        let output = self
            .run(context, &["inspect", "-f", "{{.State.Status}}", name])
            .await?;
        Ok(output.trim().to_string())
    }

    /// Raw `name\tstatus` lines for every container.
    pub async fn list_containers(&self, context: &str) -> Result<String, EngineError> {
        self.run(
            context,
            &["ps", "--all", "--format", "{{.Names}}\t{{.Status}}"],
        )
        .await
    }

    /// Names of every container, running or not.
    pub async fn container_names(&self, context: &str) -> Result<Vec<String>, EngineError> {
        let output = self
            .run(context, &["ps", "--all", "--format", "{{.Names}}"])
            .await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect())
    }

    // === Images ===

    /// Raw `repository:tag\tsize` lines for every image.
    pub async fn list_images(&self, context: &str) -> Result<String, EngineError> {
        self.run(
            context,
            &["images", "--format", "{{.Repository}}:{{.Tag}}\t{{.Size}}"],
        )
        .await
    }

    pub async fn pull_image(&self, context: &str, image: &str) -> Result<(), EngineError> {
        info!(context = %context, image = %image, "Pulling image");
        self.run(context, &["pull", image]).await?;
        Ok(())
    }

    pub async fn remove_image(&self, context: &str, image: &str) -> Result<(), EngineError> {
        info!(context = %context, image = %image, "Removing image");
        self.run(context, &["rmi", image]).await?;
        Ok(())
    }

    /// Remove dangling images, or every unused image when `all` is set.
    pub async fn prune_images(&self, context: &str, all: bool) -> Result<(), EngineError> {
        info!(context = %context, all = all, "Pruning images");
        let mut args = vec!["image", "prune", "-f"];
        if all {
            args.push("-a");
        }
        self.run(context, &args).await?;
        Ok(())
    }
}
