//! OpenAI-compatible LLM gateway

use super::protocol::{ChatCompletionRequest, ChatCompletionResponse, error_message};
use async_trait::async_trait;
use bestself_application::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Gateway for any server speaking the Chat Completions API
pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiGateway {
    /// `timeout` of zero means no request timeout
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), COMPLETIONS_PATH);
        info!("OpenAiGateway initialized for {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        debug!(
            "Sending {} turns to {}",
            request.messages.len(),
            request.model
        );

        let mut call = self
            .client
            .post(&self.endpoint)
            .json(&ChatCompletionRequest::from(request));
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, error_message(&body), request));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("unreadable reply: {e}")))?;

        parsed.into_text().ok_or(GatewayError::EmptyResponse)
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::ConnectionError(error.to_string())
    }
}

fn map_status(status: StatusCode, message: String, request: &ChatRequest) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::AuthenticationFailed(message)
        }
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(format!(
            "{} ({})",
            request.model, message
        )),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("{} {}", status.as_u16(), message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bestself_domain::{Message, Model};

    fn request() -> ChatRequest {
        ChatRequest {
            model: Model::Gpt4o,
            messages: vec![Message::user("hi")],
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gateway =
            OpenAiGateway::new("http://localhost:11434/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "bad key".into(), &request()),
            GatewayError::AuthenticationFailed(m) if m == "bad key"
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "no such model".into(), &request()),
            GatewayError::ModelNotAvailable(m) if m.starts_with("gpt-4o")
        ));
        assert!(matches!(
            map_status(StatusCode::GATEWAY_TIMEOUT, String::new(), &request()),
            GatewayError::Timeout
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), &request()),
            GatewayError::RequestFailed(m) if m == "429 slow down"
        ));
    }
}
