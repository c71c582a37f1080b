//! Discord REST v10 client.

use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info};

use super::DiscordError;
use super::types::MessagePayload;

pub const API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordClient {
    http: Client,
    base_url: String,
    token: String,
    application_id: u64,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, application_id: u64) -> Self {
        Self {
            http: Client::new(),
            base_url: API_BASE.to_string(),
            token: token.into(),
            application_id,
        }
    }

    /// Point the client at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the deferred "thinking" message with the real reply.
    pub async fn edit_original_response(
        &self,
        interaction_token: &str,
        message: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.base_url, self.application_id, interaction_token
        );
        debug!(url = %url, "Editing original interaction response");

        let response = self.http.patch(&url).json(message).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Bulk-overwrite the command set in every guild, or globally if none.
    pub async fn register_commands(
        &self,
        guild_ids: &[u64],
        commands: &Value,
    ) -> Result<(), DiscordError> {
        if guild_ids.is_empty() {
            let url = format!("{}/applications/{}/commands", self.base_url, self.application_id);
            self.put_commands(&url, commands).await?;
            info!("Registered global commands");
            return Ok(());
        }

        for guild_id in guild_ids {
            let url = format!(
                "{}/applications/{}/guilds/{}/commands",
                self.base_url, self.application_id, guild_id
            );
            self.put_commands(&url, commands).await?;
            info!(guild = *guild_id, "Registered guild commands");
        }
        Ok(())
    }

    async fn put_commands(&self, url: &str, commands: &Value) -> Result<(), DiscordError> {
        let response = self
            .http
            .put(url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(commands)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DiscordError::Api {
        status: status.as_u16(),
        body,
    })
}
