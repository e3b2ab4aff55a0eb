//! Reply providers: where assistant turns come from.
//!
//! The controller only sees the [`ReplyProvider`] trait. Which backend sits
//! behind it is decided once, at wiring time, via [`ReplyBackend::from_config`].

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use parley_core::config::{ReplyConfig, ReplyProviderKind};
use tracing::info;

use crate::error::ChatError;
use crate::types::Turn;

pub use gemini::{GeminiConfig, GeminiReplyProvider};
pub use mock::MockReplyProvider;

/// Why a reply could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    /// A required setting (usually the API credential) is missing.
    /// Raised before any network traffic.
    #[error("reply provider not configured: {0}")]
    Configuration(String),
    /// The request failed or the service answered with a non-success status.
    #[error("reply transport failed: {0}")]
    Transport(String),
    /// The service answered successfully but without a usable reply.
    #[error("reply protocol violated: {0}")]
    Protocol(String),
}

/// Coarse failure category, used to pick the fallback turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Transport,
    Protocol,
}

impl ReplyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ReplyError::Configuration(_) => FailureKind::Configuration,
            ReplyError::Transport(_) => FailureKind::Transport,
            ReplyError::Protocol(_) => FailureKind::Protocol,
        }
    }
}

/// Produces an assistant reply for a conversation.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Reply to the conversation `turns`, the last of which is the user turn
    /// being answered.
    async fn get_reply(&self, turns: &[Turn]) -> Result<String, ReplyError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// The configured reply backend.
pub enum ReplyBackend {
    Mock(MockReplyProvider),
    Gemini(GeminiReplyProvider),
}

impl ReplyBackend {
    /// Build the backend named by `config.provider`.
    ///
    /// For Gemini the credential is read from the environment variable named
    /// by `config.api_key_env`. A missing credential is not an error here; it
    /// surfaces as [`ReplyError::Configuration`] on every request.
    pub fn from_config(config: &ReplyConfig) -> Result<Self, ChatError> {
        let backend = match config.provider {
            ReplyProviderKind::Mock => {
                ReplyBackend::Mock(MockReplyProvider::new(config.mock_response.clone()))
            }
            ReplyProviderKind::Gemini => {
                let api_key = std::env::var(&config.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty());
                ReplyBackend::Gemini(GeminiReplyProvider::new(GeminiConfig {
                    base_url: config.base_url.clone(),
                    model: config.model.clone(),
                    api_key,
                    timeout_secs: config.timeout_secs,
                })?)
            }
        };
        info!(provider = backend.name(), "Reply provider ready");
        Ok(backend)
    }
}

#[async_trait]
impl ReplyProvider for ReplyBackend {
    async fn get_reply(&self, turns: &[Turn]) -> Result<String, ReplyError> {
        match self {
            ReplyBackend::Mock(p) => p.get_reply(turns).await,
            ReplyBackend::Gemini(p) => p.get_reply(turns).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ReplyBackend::Mock(p) => p.name(),
            ReplyBackend::Gemini(p) => p.name(),
        }
    }
}
