//! Conversational query analysis for Parley.
//!
//! Resolves conversational references, tags each user utterance with a
//! two-level topic, and drives the per-turn state machine that requests
//! assistant replies and recovers from reply failures.

pub mod analyzer;
pub mod classifier;
pub mod controller;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod types;

pub use analyzer::QueryAnalyzer;
pub use classifier::{TopicClassifier, TopicRule, TopicTaxonomy};
pub use controller::{PendingReply, Session, TurnController, TurnOutcome, TurnState};
pub use error::ChatError;
pub use provider::{
    FailureKind, GeminiConfig, GeminiReplyProvider, MockReplyProvider, ReplyBackend, ReplyError,
    ReplyProvider,
};
pub use resolver::{ReferenceResolver, Resolution, ResolutionRule};
pub use store::ConversationStore;
pub use types::{AnalysisResult, Role, TopicTag, Turn};
