use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dockbot::discord::commands;
use dockbot::discord::gateway::{self, Activity};
use dockbot::discord::DiscordClient;
use dockbot::server::{AppState, create_router};
use dockbot::{Config, Dispatcher, ProcessRunner};

#[derive(Parser)]
#[command(name = "dockbot")]
#[command(about = "Discord slash-command front-end for the docker CLI")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config/config.json")]
    config: PathBuf,

    /// Listen address for the interactions endpoint
    #[arg(short, long, default_value = "[::]:8080")]
    listen: String,

    /// Container engine binary
    #[arg(long, default_value = "docker")]
    docker: String,

    /// Do not overwrite the registered slash commands on startup
    #[arg(long)]
    skip_register: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dockbot=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let verifier = config.verifier()?;

    let policy = config.policy();
    let allowed_users = policy.len();
    if policy.is_empty() {
        warn!("No allowed_user_ids configured; every privileged command will be rejected");
    }

    let dispatcher = Arc::new(Dispatcher::new(
        args.docker.clone(),
        Arc::new(ProcessRunner),
        policy,
        config.utc_offset(),
    ));
    let discord = Arc::new(DiscordClient::new(config.token.clone(), config.application_id));

    if !args.skip_register {
        discord
            .register_commands(&config.guild_ids, &commands::definitions())
            .await
            .context("Failed to register slash commands")?;
    }

    let activity = config.status.as_ref().and_then(Activity::from_status);
    tokio::spawn(gateway::run_presence(config.token.clone(), activity));

    let router = create_router(Arc::new(AppState {
        dispatcher,
        discord,
        verifier,
    }));

    let listener = TcpListener::bind(&args.listen).await?;
    info!(
        addr = %args.listen,
        docker = %args.docker,
        users = allowed_users,
        "Interactions endpoint listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
