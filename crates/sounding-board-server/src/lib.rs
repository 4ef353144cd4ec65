//! Chat proxy: `POST /api/chat` forwards a conversation to Azure OpenAI.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use sounding_board_core::{
    ai::with_system_prompt,
    api::{ChatReply, ChatRequest, CHAT_PATH},
    AzureOpenAIClient, AzureSettings, ProxyError,
};

pub struct AppState {
    pub settings: AzureSettings,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(settings: AzureSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CHAT_PATH, post(chat_handler))
        .with_state(state)
}

async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match relay(&state, &body).await {
        Ok(message) => (StatusCode::OK, Json(ChatReply::message(message))).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn relay(state: &AppState, body: &[u8]) -> Result<String, ApiError> {
    let request: ChatRequest = serde_json::from_slice(body).map_err(ProxyError::from)?;

    let credentials = state.settings.credentials().ok_or(ProxyError::CredentialsMissing)?;
    let client = AzureOpenAIClient::new(state.http.clone(), credentials);

    let messages = with_system_prompt(state.settings.system_prompt(), request.messages);
    log::debug!("forwarding {} messages to {}", messages.len(), credentials.deployment);

    Ok(client.complete(&messages).await?)
}

/// Maps a proxy failure to its status and fixed caller-facing body
pub struct ApiError(pub ProxyError);

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            ProxyError::CredentialsMissing => {
                log::warn!("chat request rejected: {}", self.0);
            }
            ProxyError::Upstream { status, body } => {
                log::error!("Azure OpenAI error ({}): {}", status, body);
            }
            other => {
                log::error!("Chat API error: {}", other);
            }
        }

        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ChatReply::error(self.0.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_follows_variant() {
        let missing = ApiError::from(ProxyError::CredentialsMissing).into_response();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = ApiError::from(ProxyError::Upstream { status: 429, body: String::new() }).into_response();
        assert_eq!(upstream.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
