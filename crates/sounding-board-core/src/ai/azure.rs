use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::error::ProxyError;
use crate::state::ChatMessage;

pub const API_VERSION: &str = "2024-08-01-preview";
pub const MAX_TOKENS: u32 = 800;
pub const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct AzureRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
}

#[derive(Deserialize)]
struct AzureResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct AzureResponse {
    choices: Vec<AzureChoice>,
}

/// Prepend the system message to the caller's conversation, keeping its order
pub fn with_system_prompt(system_prompt: &str, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut outbound = Vec::with_capacity(messages.len() + 1);
    outbound.push(ChatMessage::system(system_prompt));
    outbound.extend(messages);
    outbound
}

/// Chat-completions client for one Azure OpenAI deployment
#[derive(Clone)]
pub struct AzureOpenAIClient {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
}

impl AzureOpenAIClient {
    pub fn new(client: Client, credentials: Credentials<'_>) -> Self {
        Self {
            client,
            endpoint: credentials.endpoint.trim_end_matches('/').to_string(),
            api_key: credentials.api_key.to_string(),
            deployment: credentials.deployment.to_string(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, API_VERSION
        )
    }

    /// Send the full message list and return the first choice's content
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProxyError> {
        let request = AzureRequest {
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        log::debug!("POST {} ({} messages)", self.deployment, messages.len());

        let response = self.client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            // The status is still relayed when the error body cannot be read
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("failed to read Azure OpenAI error body ({}): {}", status, e);
                    String::new()
                }
            };
            return Err(ProxyError::Upstream { status, body });
        }

        let body = response.text().await?;
        let azure_response: AzureResponse = serde_json::from_str(&body)
            .map_err(|e| ProxyError::Decode(e.to_string()))?;

        azure_response.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProxyError::Decode("response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> AzureOpenAIClient {
        AzureOpenAIClient::new(
            Client::new(),
            Credentials { endpoint, api_key: "k", deployment: "gpt-4o" },
        )
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            client("https://res.openai.azure.com").completions_url(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        assert_eq!(
            client("https://res.openai.azure.com/").completions_url(),
            client("https://res.openai.azure.com").completions_url()
        );
    }

    #[test]
    fn test_system_prompt_comes_first() {
        let inbound = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
        ];
        let outbound = with_system_prompt("steer", inbound.clone());

        assert_eq!(outbound[0], ChatMessage::system("steer"));
        assert_eq!(&outbound[1..], inbound.as_slice());
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = serde_json::to_value(AzureRequest {
            messages: &messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        })
        .unwrap();

        assert_eq!(body["max_tokens"], 800);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
    }

    #[tokio::test]
    async fn test_truncated_error_body_keeps_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            // Promises more body than it sends, then hangs up
            let _ = socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\nbusy")
                .await;
        });

        let endpoint = format!("http://{}", addr);
        let err = client(&endpoint)
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();

        match err {
            ProxyError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert!(body.is_empty());
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
