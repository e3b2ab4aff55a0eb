//! Append-only conversation log.

use crate::types::{Role, Turn};

/// Ordered log of turns. Insertion order is chronological order.
///
/// The only way to remove turns is [`ConversationStore::reset`], which
/// replaces the whole log.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A log pre-seeded with one assistant greeting, or empty when `greeting` is `None`.
    pub fn seeded(greeting: Option<&str>) -> Self {
        let mut store = Self::new();
        if let Some(text) = greeting.map(str::trim).filter(|t| !t.is_empty()) {
            store.append(Turn::assistant(text));
        }
        store
    }

    /// Append a turn at the end of the log.
    pub fn append(&mut self, turn: Turn) {
        debug_assert!(!turn.content.is_empty(), "turn content must be non-empty");
        self.turns.push(turn);
    }

    /// All turns in chronological order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent assistant turn, if any.
    pub fn last_assistant(&self) -> Option<&Turn> {
        last_with_role(&self.turns, Role::Assistant)
    }

    /// Replace the log wholesale with a freshly seeded one.
    pub fn reset(&mut self, greeting: Option<&str>) {
        *self = Self::seeded(greeting);
    }
}

/// Most recent turn with the given role in a chronological slice.
pub fn last_with_role(turns: &[Turn], role: Role) -> Option<&Turn> {
    turns.iter().rev().find(|t| t.role == role)
}
