use reqwest::Client;
use anyhow::{Context, Result};

use crate::api::{ChatReply, ChatRequest, CHAT_PATH};
use crate::state::ChatMessage;

/// HTTP client the chat UI uses to reach the proxy server
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_PATH)
    }

    /// Post the conversation and decode the reply, whatever its status.
    ///
    /// Error replies carry their text in `ChatReply::error`; only transport
    /// and decoding failures come back as `Err`.
    pub async fn send(&self, messages: Vec<ChatMessage>) -> Result<ChatReply> {
        let request = ChatRequest { messages };

        let response = self.client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .context("Failed to reach the chat server")?;

        let reply: ChatReply = response
            .json()
            .await
            .context("Chat server returned an unreadable response")?;
        Ok(reply)
    }
}
