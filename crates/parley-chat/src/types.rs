//! Conversation data model shared by the analysis pipeline and the controller.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Two-level topic label. `level_2` is always a child of `level_1` in the
/// taxonomy the classifier was built with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicTag {
    pub level_1: String,
    pub level_2: String,
}

impl TopicTag {
    pub fn new(level_1: impl Into<String>, level_2: impl Into<String>) -> Self {
        Self {
            level_1: level_1.into(),
            level_2: level_2.into(),
        }
    }
}

impl std::fmt::Display for TopicTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} \u{2192} {}", self.level_1, self.level_2)
    }
}

/// Derived artifacts attached to an analyzed user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The query with conversational references rewritten.
    pub expanded_query: String,
    pub topic: TopicTag,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Present only on user turns that went through analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    /// Epoch seconds.
    pub created_at: i64,
}

impl Turn {
    /// A user turn carrying its analysis.
    pub fn user(content: impl Into<String>, analysis: AnalysisResult) -> Self {
        Self::build(Role::User, content.into(), Some(analysis))
    }

    /// An assistant turn. Assistant turns never carry analysis.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content.into(), None)
    }

    fn build(role: Role, content: String, analysis: Option<AnalysisResult>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            analysis,
            created_at: Local::now().timestamp(),
        }
    }
}
