mod prompt;
mod settings;

pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use prompt::{analysis_request, repair_request};
pub use settings::GatewaySettings;

/// Message roles accepted by the model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One turn of a conversation sent to the model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A complete request to the model service: conversation, model identifier,
/// and an optional output-format hint (`"json"` for services that honour it).
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Errors raised while talking to the model service.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("request to model service timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("failed to reach model service: {message}")]
    Network { message: String },
    #[error("model service returned a malformed payload: {message}")]
    InvalidPayload { message: String },
}

/// Client abstraction over the remote model service. The returned text is
/// untrusted and goes through the extraction pipeline before use.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}
