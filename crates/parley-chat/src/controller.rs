//! Turn controller: the per-turn state machine.
//!
//! ```text
//! Idle --submit--> Analyzing --> AwaitingReply --reply ok--> Idle
//!                                             \--reply err--> Idle (fallback turn)
//! ```
//!
//! A [`Session`] is an owned value handed to every controller operation, so
//! any number of independent sessions can share one controller.

use parley_core::config::{ParleyConfig, SessionConfig};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzer::QueryAnalyzer;
use crate::error::ChatError;
use crate::provider::{FailureKind, ReplyBackend, ReplyError, ReplyProvider};
use crate::store::ConversationStore;
use crate::types::Turn;

/// Shown when the reply backend is missing its credential.
pub const CONFIGURATION_FALLBACK: &str =
    "I can't reach my reply service because it isn't configured yet. Please check that the API key is set, then try again.";

/// Shown for every other reply failure.
pub const CONNECTION_FALLBACK: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// User-visible fallback text for a failure category.
pub fn fallback_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Configuration => CONFIGURATION_FALLBACK,
        FailureKind::Transport | FailureKind::Protocol => CONNECTION_FALLBACK,
    }
}

// =============================================================================
// State machine
// =============================================================================

/// Where a session is within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Analyzing,
    AwaitingReply,
}

/// Validate that a state transition is allowed.
///
/// Valid transitions:
/// - Idle -> Analyzing
/// - Analyzing -> AwaitingReply
/// - AwaitingReply -> Idle
pub fn validate_transition(from: TurnState, to: TurnState) -> Result<(), ChatError> {
    let valid = matches!(
        (from, to),
        (TurnState::Idle, TurnState::Analyzing)
            | (TurnState::Analyzing, TurnState::AwaitingReply)
            | (TurnState::AwaitingReply, TurnState::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}

// =============================================================================
// Session
// =============================================================================

/// One conversation's mutable state.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    store: ConversationStore,
    state: TurnState,
    input: String,
    greeting: Option<String>,
}

impl Session {
    /// A session whose log starts with `greeting` (or empty when `None`).
    pub fn new(greeting: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: ConversationStore::seeded(greeting.as_deref()),
            state: TurnState::Idle,
            input: String::new(),
            greeting,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.greeting.clone())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The conversation so far, oldest first.
    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// True while a reply request is in flight.
    pub fn is_pending(&self) -> bool {
        self.state == TurnState::AwaitingReply
    }

    /// Close an awaited reply that will never arrive with a connection
    /// fallback turn.
    fn abandon_reply(&mut self) {
        if !self.is_pending() {
            return;
        }
        warn!(session = %self.id, "Reply abandoned; appending fallback turn");
        self.store
            .append(Turn::assistant(fallback_message(FailureKind::Transport)));
        self.state = TurnState::Idle;
    }

    /// Current contents of the input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer. Allowed in any state; only submission is guarded.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    fn transition(&mut self, to: TurnState) -> Result<(), ChatError> {
        validate_transition(self.state, to)?;
        debug!(session = %self.id, from = ?self.state, to = ?to, "Turn state transition");
        self.state = to;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

// =============================================================================
// TurnController
// =============================================================================

/// Proof that a session is awaiting a reply, with the conversation to send.
#[derive(Debug)]
#[must_use = "a pending reply must be completed or abandoned, or the session stays locked"]
pub struct PendingReply {
    session_id: Uuid,
    user_turn_id: Uuid,
    snapshot: Vec<Turn>,
}

impl PendingReply {
    /// The conversation including the new user turn.
    pub fn turns(&self) -> &[Turn] {
        &self.snapshot
    }

    pub fn user_turn_id(&self) -> Uuid {
        self.user_turn_id
    }
}

/// Unlocks the session if a reply future is dropped before it completes.
struct PendingGuard<'a> {
    session: &'a mut Session,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon_reply();
        }
    }
}

/// How a completed turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The provider's reply was appended.
    Replied,
    /// A fallback assistant turn was appended instead.
    Fallback(FailureKind),
}

/// Sequences analysis, reply generation and failure recovery for each turn.
pub struct TurnController {
    analyzer: QueryAnalyzer,
    provider: Box<dyn ReplyProvider>,
    max_message_chars: usize,
}

impl TurnController {
    pub fn new(analyzer: QueryAnalyzer, provider: impl ReplyProvider + 'static) -> Self {
        Self {
            analyzer,
            provider: Box::new(provider),
            max_message_chars: SessionConfig::default().max_message_chars,
        }
    }

    /// Wire a controller from configuration, choosing the reply backend.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ChatError> {
        let analyzer = QueryAnalyzer::from_config(&config.analysis)?;
        let provider = ReplyBackend::from_config(&config.reply)?;
        Ok(Self::new(analyzer, provider).with_max_message_chars(config.session.max_message_chars))
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    pub fn analyzer(&self) -> &QueryAnalyzer {
        &self.analyzer
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Submit the session's input buffer and run the turn to completion.
    ///
    /// `Err` means the submission was refused and nothing changed. Reply
    /// failures are not errors: they end as [`TurnOutcome::Fallback`].
    ///
    /// If the returned future is dropped while the reply is outstanding (a
    /// timeout or a losing `select!` branch), the session still returns to
    /// `Idle` with a connection fallback turn.
    pub async fn submit(&self, session: &mut Session) -> Result<TurnOutcome, ChatError> {
        let pending = self.begin_turn(session)?;
        let mut guard = PendingGuard {
            session,
            armed: true,
        };
        let result = self.provider.get_reply(pending.turns()).await;
        guard.armed = false;
        self.complete_turn(&mut *guard.session, pending, result)
    }

    /// Put `text` in the input buffer and submit it.
    pub async fn submit_text(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        if session.is_pending() {
            return Err(ChatError::ReplyPending);
        }
        session.set_input(text);
        self.submit(session).await
    }

    /// First half of a turn: analyze the input, append the user turn and
    /// lock the session until [`complete_turn`](Self::complete_turn).
    pub fn begin_turn(&self, session: &mut Session) -> Result<PendingReply, ChatError> {
        if session.is_pending() {
            return Err(ChatError::ReplyPending);
        }
        let text = session.input.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_chars {
            return Err(ChatError::MessageTooLong(self.max_message_chars));
        }
        let text = text.to_string();

        session.transition(TurnState::Analyzing)?;
        let analysis = self.analyzer.analyze(&text, session.turns());
        info!(
            session = %session.id,
            topic = %analysis.topic,
            expanded = %analysis.expanded_query,
            "User turn analyzed"
        );

        let turn = Turn::user(text, analysis);
        let user_turn_id = turn.id;
        session.store.append(turn);
        session.input.clear();
        session.transition(TurnState::AwaitingReply)?;

        Ok(PendingReply {
            session_id: session.id,
            user_turn_id,
            snapshot: session.turns().to_vec(),
        })
    }

    /// Second half of a turn: append the reply or a fallback and unlock.
    pub fn complete_turn(
        &self,
        session: &mut Session,
        pending: PendingReply,
        result: Result<String, ReplyError>,
    ) -> Result<TurnOutcome, ChatError> {
        if pending.session_id != session.id {
            return Err(ChatError::InvalidTransition(session.state, TurnState::Idle));
        }
        validate_transition(session.state, TurnState::Idle)?;

        let result = result.and_then(|reply| {
            if reply.trim().is_empty() {
                Err(ReplyError::Protocol("reply text is empty".to_string()))
            } else {
                Ok(reply)
            }
        });

        let outcome = match result {
            Ok(reply) => {
                session.store.append(Turn::assistant(reply));
                info!(session = %session.id, provider = self.provider.name(), "Assistant turn appended");
                TurnOutcome::Replied
            }
            Err(err) => {
                let kind = err.kind();
                warn!(
                    session = %session.id,
                    provider = self.provider.name(),
                    kind = ?kind,
                    error = %err,
                    "Reply failed; appending fallback turn"
                );
                session.store.append(Turn::assistant(fallback_message(kind)));
                TurnOutcome::Fallback(kind)
            }
        };

        session.transition(TurnState::Idle)?;
        Ok(outcome)
    }

    /// Give up on a reply started with [`begin_turn`](Self::begin_turn).
    ///
    /// Ends the turn as a transport failure.
    pub fn abandon_turn(
        &self,
        session: &mut Session,
        pending: PendingReply,
    ) -> Result<TurnOutcome, ChatError> {
        self.complete_turn(
            session,
            pending,
            Err(ReplyError::Transport("reply abandoned".to_string())),
        )
    }

    /// Reset the session to its freshly seeded state.
    ///
    /// Refused while a reply is pending so an in-flight reply never lands in
    /// a log it was not computed from.
    pub fn clear(&self, session: &mut Session) -> Result<(), ChatError> {
        if session.is_pending() {
            return Err(ChatError::ReplyPending);
        }
        session.store.reset(session.greeting.as_deref());
        session.input.clear();
        info!(session = %session.id, "Conversation cleared");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
