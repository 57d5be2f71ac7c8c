use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Supplies raw strategy export text for the parser. Fetch failures are
/// the caller's concern; there is no retry here.
#[async_trait]
pub trait StrategySource: Send + Sync {
    async fn fetch_strategy_text(&self) -> Result<String>;
}

/// Sends one generated command string to a bot and returns its textual
/// reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, command: &str) -> Result<String>;
}

/// Send commands one by one, in order, stopping at the first failure.
pub async fn dispatch_all(dispatcher: &dyn CommandDispatcher, commands: &[String]) -> Result<Vec<String>> {
    let mut replies = Vec::with_capacity(commands.len());
    for command in commands {
        let reply = dispatcher.dispatch(command).await?;
        debug!("bot reply to '{}': {}", command, reply);
        replies.push(reply);
    }
    Ok(replies)
}

/// HTTP client for one remote bot's control endpoint. Requests carry an
/// API key and an HMAC-SHA256 signature over the timestamp and payload.
#[derive(Debug, Clone)]
pub struct BotClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl BotClient {
    pub fn new(base_url: String, api_key: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            secret_key,
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn signed_request(&self, path: &str, body: Option<String>) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let timestamp = Utc::now().timestamp_millis().to_string();
        let payload = match &body {
            Some(body) => format!("{}{}", timestamp, body),
            None => timestamp.clone(),
        };
        let signature = self.sign(&payload);

        let request = match body {
            Some(body) => self.client.post(&url).body(body),
            None => self.client.get(&url),
        };
        let response = request
            .header("X-API-KEY", &self.api_key)
            .header("X-TIMESTAMP", timestamp)
            .header("X-SIGNATURE", signature)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("bot request {} failed: HTTP {}", path, status));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl StrategySource for BotClient {
    async fn fetch_strategy_text(&self) -> Result<String> {
        self.signed_request("/api/strategies/export", None).await
    }
}

#[async_trait]
impl CommandDispatcher for BotClient {
    async fn dispatch(&self, command: &str) -> Result<String> {
        self.signed_request("/api/command", Some(command.to_string()))
            .await
    }
}
