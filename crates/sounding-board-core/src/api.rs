//! Wire types for `POST /api/chat`

use serde::{Deserialize, Serialize};

use crate::state::ChatMessage;

pub const CHAT_PATH: &str = "/api/chat";

/// Request body sent by the chat client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Response body of the proxy.
///
/// Exactly one field is set: `message` on success, `error` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn message(content: impl Into<String>) -> Self {
        Self { message: Some(content.into()), error: None }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { message: None, error: Some(text.into()) }
    }
}
