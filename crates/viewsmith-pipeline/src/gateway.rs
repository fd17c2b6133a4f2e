//! Model gateway - the single seam to the model service
//!
//! The pipeline consumes one contract: hand over a system prompt, a user
//! prompt and sampling parameters, get back raw text or a typed failure.
//! Everything returned through this seam is untrusted - empty, truncated at
//! the token budget, or in open violation of every structural constraint the
//! prompt asked for. The normalizer deals with that; the gateway only deals
//! with transport and the failure taxonomy.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::prompt::GenerationParams;

/// Typed gateway failures. Every variant is recoverable by resubmission.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("model service rejected the credentials: {0}")]
    Auth(String),

    #[error("model service quota exhausted: {0}")]
    Quota(String),

    #[error("network error reaching the model service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed model service response: {0}")]
    Malformed(String),
}

/// The contract the pipeline requires from a model service.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Run one generation. Returns the raw completion text; the caller must
    /// treat every byte of it as untrusted.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError>;
}

// ─── OpenAI-compatible wire types ───────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Gateway for any OpenAI-compatible chat-completions endpoint.
pub struct HttpGateway {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            http_client: reqwest::Client::new(),
        }
    }
}

/// Map a non-success HTTP status to the failure taxonomy.
fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => GatewayError::Quota(detail),
        _ => GatewayError::Malformed(detail),
    }
}

/// Extract the completion text from a decoded response body.
///
/// An empty completion is *not* an error here - the normalizer guarantees a
/// renderable unit even for empty text. Only a missing choice list is
/// malformed.
fn extract_content(response: ChatResponse) -> Result<String, GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Malformed("response contained no choices".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: &params.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: params.temperature,
            max_tokens: params.max_output_units,
            stop: params.stop_sequences.iter().map(String::as_str).collect(),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(GatewayError::Network)?;
        let decoded: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Malformed(format!("undecodable body: {e}")))?;

        let content = extract_content(decoded)?;
        log::debug!("gateway returned {} bytes of raw text", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            GatewayError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "key revoked"),
            GatewayError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GatewayError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            GatewayError::Malformed(_)
        ));
    }

    #[test]
    fn test_extract_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"function A(){}"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "function A(){}");
    }

    #[test]
    fn test_empty_content_is_ok() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(extract_content(response).unwrap(), "");
    }

    #[test]
    fn test_no_choices_is_malformed() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(response),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_serialization_skips_empty_stop() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage { role: "system", content: "s" }],
            temperature: 0.1,
            max_tokens: 10,
            stop: vec![],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("stop"));
    }
}
