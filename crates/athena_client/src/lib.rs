//! Chat-completion client used to turn a rendered prompt into a summary.
//!
//! The [`ChatClient`] trait is the seam the pipeline depends on; the
//! reqwest-backed implementation lives in [`http_client`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API key not set")]
    AuthMissing,
    #[error("chat request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("chat request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not decode chat response: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Non-200 responses, transport failures and timeouts all count as the
    /// endpoint being unreachable from the caller's point of view.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            ChatError::Http { .. } | ChatError::Network(_) | ChatError::Timeout(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
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

#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Send the conversation and return the text of the first choice.
    ///
    /// Exactly one request is made; callers decide whether to retry.
    async fn send(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}
