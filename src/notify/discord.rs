//! Discord webhook delivery.
//!
//! Discord rejects message content over 2000 characters, so reports are
//! posted as several messages of at most `max_message_len` chars each,
//! in order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{chunk_message, Notifier};

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

pub struct DiscordWebhook {
    http: Client,
    url: SecretString,
    max_message_len: usize,
}

impl DiscordWebhook {
    pub fn new(url: SecretString, max_message_len: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("odds-signal/0.1.0")
            .build()
            .context("Failed to build HTTP client for Discord")?;

        Ok(Self {
            http,
            url,
            max_message_len,
        })
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, text: &str) -> Result<()> {
        let chunks = chunk_message(text, self.max_message_len);

        for (i, chunk) in chunks.iter().enumerate() {
            debug!(chunk = i + 1, of = chunks.len(), chars = chunk.chars().count(), "Posting to Discord");

            let resp = self
                .http
                .post(self.url.expose_secret().as_str())
                .json(&WebhookMessage { content: chunk })
                .send()
                .await
                .context("Discord webhook request failed")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Discord webhook error {status}: {body}");
            }
        }

        info!(messages = chunks.len(), "Report posted to Discord");
        Ok(())
    }

    fn name(&self) -> String {
        "discord".to_string()
    }
}
