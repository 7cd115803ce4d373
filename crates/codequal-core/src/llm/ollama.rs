use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{ChatMessage, ChatRequest, GatewayError, GatewaySettings, ModelGateway};

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Gateway backed by an Ollama-compatible `/api/chat` endpoint.
///
/// Construct one client per run and pass it into the audit loop; the inner
/// reqwest client pools connections across calls.
#[derive(Debug, Clone)]
pub struct OllamaGateway {
    http: Client,
    endpoint: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl OllamaGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent("codequal/0.1")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build model service HTTP client")?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
        })
    }

    /// Lightweight preflight against `/api/tags`. `Ok(false)` means the
    /// service is unreachable or unhealthy, not a hard error.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.endpoint);
        debug!(%url, "checking model service health");
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(err) if err.is_timeout() || err.is_connect() => {
                warn!(%err, "model service unreachable");
                Ok(false)
            }
            Err(err) => Err(err).context("model service health check failed"),
        }
    }

    async fn send_once(&self, body: &OllamaChatRequest<'_>) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.endpoint);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.classify_transport(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: OllamaChatResponse =
            response
                .json()
                .await
                .map_err(|err| GatewayError::InvalidPayload {
                    message: err.to_string(),
                })?;
        if !reply.done {
            warn!("model service reports incomplete generation");
        }
        Ok(reply.message.content)
    }

    fn classify_transport(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            GatewayError::Network {
                message: err.to_string(),
            }
        }
    }

    fn retryable(err: &GatewayError) -> bool {
        match err {
            GatewayError::Timeout { .. } | GatewayError::Network { .. } => true,
            GatewayError::Api { status, .. } => *status >= 500,
            GatewayError::InvalidPayload { .. } => false,
        }
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let body = OllamaChatRequest {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            format: request.format.as_deref(),
        };

        let start = Instant::now();
        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(content) => {
                    info!(
                        model = %request.model,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "model call completed"
                    );
                    return Ok(content);
                }
                Err(err) if Self::retryable(&err) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%err, attempt, "model call failed, retrying");
                    sleep(RETRY_DELAY).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatMessage {
    #[serde(default)]
    content: String,
}
