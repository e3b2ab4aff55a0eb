//! Error types for the conversational front-end.

use parley_core::error::ParleyError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a reply is still pending")]
    ReplyPending,
    #[error("invalid state transition: {0:?} -> {1:?}")]
    InvalidTransition(crate::controller::TurnState, crate::controller::TurnState),
    #[error("topic {level_1}/{level_2} is not in the taxonomy")]
    InvalidTopic { level_1: String, level_2: String },
    #[error("invalid topic rule: {0}")]
    InvalidRule(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<ParleyError> for ChatError {
    fn from(err: ParleyError) -> Self {
        ChatError::Config(err.to_string())
    }
}
