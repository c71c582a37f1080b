//! dockbot: Discord slash-command front-end for the docker CLI.
//!
//! Authorized users drive container and image lifecycle through slash
//! commands; every command becomes one or two `docker --context=<ctx> ...`
//! invocations whose output is rendered back into the channel. dockbot keeps
//! no state of its own beyond the configuration file.

pub mod command;
pub mod config;
pub mod discord;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod format;
pub mod policy;
pub mod server;

pub use command::{Command, CommandRequest, ContainerAction, DEFAULT_CONTEXT, ImageAction};
pub use config::Config;
pub use dispatch::{Dispatcher, Platform};
pub use engine::{CommandRunner, DockerCli, ProcessRunner};
pub use error::{ConfigError, DispatchError, EngineError};
pub use format::Reply;
pub use policy::AuthorizationPolicy;
