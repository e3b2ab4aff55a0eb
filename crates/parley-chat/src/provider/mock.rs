//! Deterministic local reply provider.
//!
//! Answers every conversation with the same text. Used when no remote
//! backend is available.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{ReplyError, ReplyProvider};
use crate::types::Turn;

/// Mock provider returning a fixed reply.
#[derive(Debug, Clone)]
pub struct MockReplyProvider {
    response: String,
    calls: Arc<AtomicUsize>,
}

impl MockReplyProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of replies produced so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyProvider for MockReplyProvider {
    async fn get_reply(&self, _turns: &[Turn]) -> Result<String, ReplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
