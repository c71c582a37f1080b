//! HTTP interactions endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::command::{Command, CommandRequest};
use crate::discord::commands::{self, AutocompleteQuery};
use crate::discord::types::{Interaction, InteractionResponse, InteractionType};
use crate::discord::verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::discord::{DiscordClient, SignatureVerifier};
use crate::dispatch::Dispatcher;

/// Shared application state
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub discord: Arc<DiscordClient>,
    pub verifier: SignatureVerifier,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn reject(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}

async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(signature), Some(timestamp)) = (
        header(&headers, SIGNATURE_HEADER),
        header(&headers, TIMESTAMP_HEADER),
    ) else {
        return reject(StatusCode::UNAUTHORIZED, "missing request signature");
    };
    if let Err(e) = state.verifier.verify(timestamp, signature, &body) {
        warn!(error = %e, "Rejected interaction");
        return reject(StatusCode::UNAUTHORIZED, "invalid request signature");
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "Malformed interaction");
            return reject(StatusCode::BAD_REQUEST, "malformed interaction");
        }
    };

    match interaction.kind {
        InteractionType::Ping => Json(InteractionResponse::pong()).into_response(),
        InteractionType::ApplicationCommand => handle_command(state, interaction).await,
        InteractionType::Autocomplete => handle_autocomplete(state, interaction).await,
        InteractionType::Other(kind) => {
            warn!(kind = kind, "Unsupported interaction type");
            reject(StatusCode::BAD_REQUEST, "unsupported interaction type")
        }
    }
}

async fn handle_command(state: Arc<AppState>, interaction: Interaction) -> Response {
    let Some(user_id) = interaction.user_id() else {
        return reject(StatusCode::BAD_REQUEST, "interaction without user");
    };
    let Some(data) = interaction.data.as_ref() else {
        return reject(StatusCode::BAD_REQUEST, "interaction without data");
    };
    let command = match commands::parse(data) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Unparseable command");
            return reject(StatusCode::BAD_REQUEST, "invalid command");
        }
    };

    let request = CommandRequest::new(command, user_id);
    info!(user = user_id, command = ?request.command, "Received command");

    // Nothing to wait for: answer inline.
    if request.command == Command::Ping || !state.dispatcher.is_authorized(&request) {
        let reply = state.dispatcher.dispatch(request).await;
        return Json(InteractionResponse::message(reply)).into_response();
    }

    let token = interaction.token;
    tokio::spawn(async move {
        let reply = state.dispatcher.dispatch(request).await;
        if let Err(e) = state
            .discord
            .edit_original_response(&token, &reply.into())
            .await
        {
            error!(error = %e, "Failed to deliver reply");
        }
    });

    Json(InteractionResponse::deferred()).into_response()
}

async fn handle_autocomplete(state: Arc<AppState>, interaction: Interaction) -> Response {
    let query = interaction
        .data
        .as_ref()
        .and_then(commands::parse_autocomplete);

    let names = match (interaction.user_id(), query) {
        (Some(user_id), Some(AutocompleteQuery { context, prefix })) => {
            state
                .dispatcher
                .autocomplete_containers(user_id, &context, &prefix)
                .await
        }
        _ => Vec::new(),
    };

    Json(InteractionResponse::autocomplete(names)).into_response()
}
