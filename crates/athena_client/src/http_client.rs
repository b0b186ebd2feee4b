//! HTTP implementation of [`ChatClient`](crate::ChatClient) for
//! OpenAI-compatible chat-completion endpoints.

use crate::config::Config;
use crate::observability::{RequestOutcome, record_request};
use crate::{ChatClient, ChatError, ChatMessage};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat client backed by reqwest. One POST per [`send`](ChatClient::send).
#[derive(Clone, Debug)]
pub struct ReqwestChatClient {
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ReqwestChatClient {
    /// Create a client for `endpoint` (the full chat-completions URL).
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            model: model.into(),
            api_key,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        Self::new(
            &config.endpoint,
            config.model.clone(),
            config.api_key.clone(),
            config.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ChatError {
        if err.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else {
            ChatError::Network(err)
        }
    }

    /// Extract error information from a non-200 response.
    async fn error_from_response(resp: reqwest::Response) -> ChatError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        ChatError::Http {
            status,
            body: body_snippet,
        }
    }

    fn decode(body: &str) -> Result<String, ChatError> {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(body).map_err(|e| ChatError::Decode(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Decode("response contained no choices".into()))?;
        choice
            .message
            .content
            .ok_or_else(|| ChatError::Decode("first choice has no content".into()))
    }

    async fn send_once(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.api_key.as_ref().ok_or(ChatError::AuthMissing)?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "sending chat completion request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(Self::error_from_response(resp).await);
        }

        let body = resp.text().await.map_err(|e| self.map_transport_error(e))?;
        Self::decode(&body)
    }
}

fn outcome_of(result: &Result<String, ChatError>) -> RequestOutcome {
    match result {
        Ok(_) => RequestOutcome::Success,
        Err(ChatError::AuthMissing) => RequestOutcome::AuthMissing,
        Err(ChatError::Http { .. }) => RequestOutcome::HttpStatus,
        Err(ChatError::Timeout(_)) => RequestOutcome::Timeout,
        Err(ChatError::Decode(_)) => RequestOutcome::Decode,
        Err(ChatError::Network(_)) | Err(ChatError::Config(_)) => RequestOutcome::Network,
    }
}

#[async_trait]
impl ChatClient for ReqwestChatClient {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let started = Instant::now();
        let result = self.send_once(messages).await;
        let elapsed = match &result {
            Err(ChatError::AuthMissing) => None,
            _ => Some(started.elapsed()),
        };
        record_request(outcome_of(&result), elapsed);
        match &result {
            Ok(text) => tracing::info!(chars = text.len(), "chat completion received"),
            Err(e) => tracing::warn!(error = %e, "chat completion failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(ReqwestChatClient::decode(body).unwrap(), "hello");
    }

    #[test]
    fn decode_rejects_empty_choices() {
        let err = ReqwestChatClient::decode(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[test]
    fn decode_rejects_null_content() {
        let err =
            ReqwestChatClient::decode(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ReqwestChatClient::decode("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = ReqwestChatClient::new(
            "http://127.0.0.1:9/never",
            "gpt-test",
            None,
            Duration::from_secs(1),
        )
        .expect("client");
        let err = client.send(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::AuthMissing));
    }
}
