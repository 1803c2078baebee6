//! Streaming chat client

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;

use crate::config::InsightsConfig;
use crate::error::{Error, Result};

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Stream of raw response body chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// A chat endpoint that streams its reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit a conversation and return the reply body as it arrives.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ByteStream>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// HTTP client for a streaming chat-completion endpoint.
pub struct HttpChatClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
}

impl HttpChatClient {
    pub fn new(config: &InsightsConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| Error::Config("insights.endpoint is required".to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = config.resolved_api_key() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| Error::Config(format!("invalid insights api_key: {}", e)))?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs.max(1)));
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for HttpChatClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ByteStream> {
        let request = ChatRequest {
            messages,
            stream: true,
            model: self.model.as_deref(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Insight(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Insight(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        tracing::debug!(endpoint = %self.endpoint, "Insight stream opened");

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| Error::Insight(format!("stream interrupted: {}", e)))
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let body = serde_json::to_value(ChatRequest {
            messages: &messages,
            stream: true,
            model: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "messages": [{"role": "user", "content": "hello"}],
                "stream": true
            })
        );
    }

    #[test]
    fn test_client_requires_endpoint() {
        assert!(HttpChatClient::new(&InsightsConfig::default()).is_err());
    }
}
