// Discord REST client that delivers direct messages as a bot user.
//
// Sending a DM is two calls: open (or fetch) the DM channel with the
// recipient, then post the message into that channel.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::{ChatSender, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DISCORD_API_URL: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Discord rejects message content longer than this.
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("request to Discord failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Discord response had no channel id: {0}")]
    MissingChannelId(String),

    #[error("message is {len} characters, Discord allows {max}", max = MAX_MESSAGE_LEN)]
    MessageTooLong { len: usize },
}

// ---------------------------------------------------------------------------
// DiscordClient
// ---------------------------------------------------------------------------

/// A single bot identity.
///
/// Only the REST API is used. Discord refuses Create Message from a bot that
/// has never identified on the gateway, so each token must have connected
/// over the gateway at least once (for example by running it in any gateway
/// client) before it can deliver DMs here.
pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
    name: String,
    base_url: String,
}

impl DiscordClient {
    /// Create a client for the bot `token`. `name` is only used in logs.
    pub fn new(token: String, name: String) -> Result<Self, DiscordError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            token,
            name,
            base_url: DISCORD_API_URL.to_string(),
        })
    }

    /// Build one client per token, named `bot-0`, `bot-1`, ...
    pub fn from_tokens(tokens: &[String]) -> Result<Vec<Self>, DiscordError> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| Self::new(token.clone(), format!("bot-{i}")))
            .collect()
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn open_dm_channel(&self, recipient: UserId) -> Result<String, DiscordError> {
        let response = self
            .http
            .post(format!("{}/users/@me/channels", self.base_url))
            .header("Authorization", self.authorization())
            .json(&serde_json::json!({ "recipient_id": recipient.to_string() }))
            .send()
            .await?;
        let text = checked_body(response).await?;
        parse_channel_id(&text).ok_or(DiscordError::MissingChannelId(text))
    }

    async fn post_message(&self, channel_id: &str, body: &str) -> Result<(), DiscordError> {
        let response = self
            .http
            .post(format!("{}/channels/{channel_id}/messages", self.base_url))
            .header("Authorization", self.authorization())
            .json(&serde_json::json!({ "content": body }))
            .send()
            .await?;
        checked_body(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSender for DiscordClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_direct_message(&self, recipient: UserId, body: &str) -> anyhow::Result<()> {
        let len = body.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(DiscordError::MessageTooLong { len }.into());
        }

        let channel_id = self.open_dm_channel(recipient).await?;
        debug!(bot = %self.name, %recipient, %channel_id, "opened DM channel");
        self.post_message(&channel_id, body).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

async fn checked_body(response: reqwest::Response) -> Result<String, DiscordError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(DiscordError::Status { status, body });
    }
    Ok(body)
}

/// Extract `id` from a channel object.
///
/// Expected shape: `{ "id": "1234", "type": 1, "recipients": [...] }`
pub(crate) fn parse_channel_id(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("id")?.as_str().map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dm_channel_id() {
        let data = r#"{
            "id": "319674150115610528",
            "type": 1,
            "last_message_id": null,
            "recipients": [{ "id": "82198898841029460", "username": "test" }]
        }"#;
        assert_eq!(parse_channel_id(data), Some("319674150115610528".to_string()));
    }

    #[test]
    fn parse_channel_id_missing_field() {
        assert_eq!(parse_channel_id(r#"{ "type": 1 }"#), None);
    }

    #[test]
    fn parse_channel_id_numeric_id_is_rejected() {
        assert_eq!(parse_channel_id(r#"{ "id": 12 }"#), None);
    }

    #[test]
    fn parse_channel_id_invalid_json() {
        assert_eq!(parse_channel_id("not json"), None);
    }

    #[test]
    fn clients_are_named_by_position() {
        let clients =
            DiscordClient::from_tokens(&["a".to_string(), "b".to_string()]).unwrap();
        let names: Vec<&str> = clients.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["bot-0", "bot-1"]);
        assert_eq!(clients[1].authorization(), "Bot b");
    }

    #[tokio::test]
    async fn oversized_message_is_rejected_before_any_request() {
        let client = DiscordClient::new("t".into(), "bot-0".into()).unwrap();
        let body = "x".repeat(MAX_MESSAGE_LEN + 1);
        let err = client
            .send_direct_message(UserId(1), &body)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2001"));
    }
}
