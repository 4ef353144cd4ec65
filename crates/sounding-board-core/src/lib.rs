pub mod ai;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use ai::AzureOpenAIClient;
pub use api::{ChatReply, ChatRequest};
pub use client::ProxyClient;
pub use config::{AzureSettings, ClientConfig, Credentials};
pub use error::ProxyError;
pub use state::{ChatMessage, ChatRole, Conversation};
