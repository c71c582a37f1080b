//! Interactions endpoint tests.
//!
//! Each test runs the real router on an ephemeral port next to a fake Discord
//! REST API that records follow-up edits.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Uri};
use axum::{Json, Router, extract::Path, routing::{patch, put}};
use ed25519_dalek::{Signer, SigningKey};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use common::{ALLOWED_USER, STRANGER, ScriptedRunner, argv, dispatcher};
use dockbot::discord::{DiscordClient, SignatureVerifier, commands};
use dockbot::server::{AppState, create_router};

const APPLICATION_ID: u64 = 4242;

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[9u8; 32])
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

struct TestServer {
    addr: SocketAddr,
    client: Client,
    edits: mpsc::UnboundedReceiver<(String, Value)>,
}

impl TestServer {
    async fn spawn(runner: &Arc<ScriptedRunner>) -> Self {
        let (edit_tx, edits) = mpsc::unbounded_channel();
        let fake_discord = Router::new().route(
            "/webhooks/{application_id}/{token}/messages/@original",
            patch(move |Path((_, token)): Path<(u64, String)>, Json(body): Json<Value>| {
                let edit_tx = edit_tx.clone();
                async move {
                    let _ = edit_tx.send((token, body.clone()));
                    Json(body)
                }
            }),
        );
        let discord_addr = serve(fake_discord).await;

        let verifier =
            SignatureVerifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes()))
                .unwrap();
        let state = Arc::new(AppState {
            dispatcher: Arc::new(dispatcher(runner)),
            discord: Arc::new(
                DiscordClient::new("test-token", APPLICATION_ID)
                    .with_base_url(format!("http://{}", discord_addr)),
            ),
            verifier,
        });
        let addr = serve(create_router(state)).await;

        Self {
            addr,
            client: Client::new(),
            edits,
        }
    }

    async fn post_signed(&self, body: &Value) -> Response {
        let body = body.to_string();
        let timestamp = "1760400000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body.as_bytes());
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        self.client
            .post(format!("http://{}/interactions", self.addr))
            .header("X-Signature-Ed25519", signature)
            .header("X-Signature-Timestamp", timestamp)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    async fn next_edit(&mut self) -> (String, Value) {
        tokio::time::timeout(Duration::from_secs(5), self.edits.recv())
            .await
            .expect("no follow-up edit within 5s")
            .expect("edit channel closed")
    }
}

fn command(user_id: u64, data: Value) -> Value {
    json!({
        "type": 2,
        "token": "interaction-token",
        "member": { "user": { "id": user_id.to_string() } },
        "data": data
    })
}

fn execute(action: &str, name: &str) -> Value {
    json!({
        "name": "docker",
        "options": [{
            "name": "execute",
            "type": 1,
            "options": [
                { "name": "action", "type": 3, "value": action },
                { "name": "container_name", "type": 3, "value": name },
                { "name": "context", "type": 3, "value": "prod" }
            ]
        }]
    })
}

// =============================================================================
// Signature and protocol
// =============================================================================

#[tokio::test]
async fn test_ping_interaction_gets_pong() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server.post_signed(&json!({ "type": 1 })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "type": 1 }));
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server
        .client
        .post(format!("http://{}/interactions", server.addr))
        .body(r#"{"type":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server
        .client
        .post(format!("http://{}/interactions", server.addr))
        .header("X-Signature-Ed25519", "00".repeat(64))
        .header("X-Signature-Timestamp", "1760400000")
        .body(r#"{"type":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_unknown_command_is_bad_request() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&command(ALLOWED_USER, json!({ "name": "reboot" })))
        .await;
    assert_eq!(response.status(), 400);
    assert!(runner.calls().is_empty());
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn test_ping_command_replies_inline() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&command(STRANGER, json!({ "name": "ping" })))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "`\u{1F3D3} Pong!`");
}

#[tokio::test]
async fn test_unauthorized_command_replies_inline() {
    let runner = ScriptedRunner::new();
    let server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&command(STRANGER, execute("stop", "web")))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], 4);
    assert_eq!(
        body["data"]["content"],
        "You are not authorized to use this bot."
    );
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_authorized_command_is_deferred_then_edited() {
    let runner = ScriptedRunner::new();
    let mut server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&command(ALLOWED_USER, execute("start", "web")))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "type": 5 }));

    let (token, edit) = server.next_edit().await;
    assert_eq!(token, "interaction-token");
    assert_eq!(edit["embeds"][0]["title"], "**__Docker Management__**");
    assert_eq!(
        edit["embeds"][0]["description"],
        "Container `web` has been started."
    );
    assert_eq!(
        runner.calls(),
        vec![argv(&["docker", "--context=prod", "start", "web"])]
    );
}

#[tokio::test]
async fn test_failed_command_edit_carries_error_text() {
    let runner = ScriptedRunner::new().fail("Error response from daemon: No such container: web");
    let mut server = TestServer::spawn(&runner).await;

    server
        .post_signed(&command(ALLOWED_USER, execute("restart", "web")))
        .await;

    let (_, edit) = server.next_edit().await;
    assert_eq!(
        edit["content"],
        "Error executing Docker command: Error response from daemon: No such container: web"
    );
    assert_eq!(edit["embeds"], json!([]));
}

// =============================================================================
// Autocomplete
// =============================================================================

#[tokio::test]
async fn test_autocomplete_returns_choices() {
    let runner = ScriptedRunner::new().ok("web\nworker\ndb\n");
    let server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&json!({
            "type": 4,
            "token": "t",
            "member": { "user": { "id": ALLOWED_USER.to_string() } },
            "data": {
                "name": "docker",
                "options": [{
                    "name": "execute",
                    "type": 1,
                    "options": [
                        { "name": "action", "type": 3, "value": "stop" },
                        { "name": "container_name", "type": 3, "value": "w", "focused": true }
                    ]
                }]
            }
        }))
        .await;

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], 8);
    assert_eq!(
        body["data"]["choices"],
        json!([
            { "name": "web", "value": "web" },
            { "name": "worker", "value": "worker" }
        ])
    );
    assert_eq!(
        runner.calls(),
        vec![argv(&[
            "docker",
            "--context=default",
            "ps",
            "--all",
            "--format",
            "{{.Names}}"
        ])]
    );
}

#[tokio::test]
async fn test_autocomplete_failure_returns_no_choices() {
    let runner = ScriptedRunner::new().fail("Cannot connect to the Docker daemon");
    let server = TestServer::spawn(&runner).await;

    let response = server
        .post_signed(&json!({
            "type": 4,
            "member": { "user": { "id": ALLOWED_USER.to_string() } },
            "data": {
                "name": "docker",
                "options": [{
                    "name": "execute",
                    "options": [{ "name": "container_name", "value": "", "focused": true }]
                }]
            }
        }))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["choices"], json!([]));
}

// =============================================================================
// Command registration
// =============================================================================

type Registration = (String, Option<String>, Value);

async fn fake_commands_api() -> (DiscordClient, mpsc::UnboundedReceiver<Registration>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let record = move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
        let tx = tx.clone();
        async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let _ = tx.send((uri.path().to_string(), auth, body.clone()));
            Json(body)
        }
    };
    let router = Router::new()
        .route("/applications/{application_id}/commands", put(record.clone()))
        .route(
            "/applications/{application_id}/guilds/{guild_id}/commands",
            put(record),
        );
    let addr = serve(router).await;

    let client = DiscordClient::new("test-token", APPLICATION_ID)
        .with_base_url(format!("http://{}", addr));
    (client, rx)
}

#[tokio::test]
async fn test_register_commands_globally_without_guilds() {
    let (client, mut registrations) = fake_commands_api().await;

    client
        .register_commands(&[], &commands::definitions())
        .await
        .unwrap();

    let (path, auth, body) = registrations.recv().await.unwrap();
    assert_eq!(path, "/applications/4242/commands");
    assert_eq!(auth.as_deref(), Some("Bot test-token"));
    assert_eq!(body, commands::definitions());
    assert!(registrations.try_recv().is_err());
}

#[tokio::test]
async fn test_register_commands_per_guild() {
    let (client, mut registrations) = fake_commands_api().await;

    client
        .register_commands(&[1, 2], &commands::definitions())
        .await
        .unwrap();

    let mut paths = Vec::new();
    while let Ok((path, auth, body)) = registrations.try_recv() {
        assert_eq!(auth.as_deref(), Some("Bot test-token"));
        assert_eq!(body, commands::definitions());
        paths.push(path);
    }
    assert_eq!(
        paths,
        vec![
            "/applications/4242/guilds/1/commands",
            "/applications/4242/guilds/2/commands"
        ]
    );
}
