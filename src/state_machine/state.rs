//! Session state types

use crate::quiz::{Quiz, Topic};
use std::fmt;
use std::time::Duration;

/// Quizzes allowed per topic cycle
pub const MAX_QUIZZES: u32 = 100;

/// Pause between grading an answer and issuing the next quiz
pub const ADVANCE_DELAY: Duration = Duration::from_secs(15);

// ============================================================================
// Identities
// ============================================================================

/// Stable user identity assigned by the chat transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat the session replies into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Transport message carrying the control that triggered an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// Identifies one topic cycle of a session.
///
/// Bumped whenever the cycle ends (start, topic choice, stop). Delayed actions
/// carry the token they were scheduled under and are dropped if it no longer
/// matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CycleToken(u64);

impl CycleToken {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[cfg(test)]
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CycleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Where a session is in its quiz cycle.
///
/// The active quiz lives inside `AwaitingAnswer`, next to its topic, so a quiz
/// can never exist without a topic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No topic chosen
    #[default]
    Idle,

    /// Topic set, no quiz waiting for an answer
    TopicChosen { topic: Topic },

    /// A quiz has been sent and awaits the user's answer
    AwaitingAnswer { topic: Topic, quiz: Quiz },
}

impl SessionState {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::TopicChosen { .. } => "topic_chosen",
            SessionState::AwaitingAnswer { .. } => "awaiting_answer",
        }
    }
}

/// Per-user session record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub state: SessionState,
    /// Quizzes issued in the current topic cycle
    pub quiz_count: u32,
    pub cycle: CycleToken,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_topic(&self) -> Option<Topic> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::TopicChosen { topic } | SessionState::AwaitingAnswer { topic, .. } => {
                Some(*topic)
            }
        }
    }

    pub fn active_quiz(&self) -> Option<&Quiz> {
        match &self.state {
            SessionState::AwaitingAnswer { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    /// Back to `Idle` under a fresh cycle
    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            state: SessionState::Idle,
            quiz_count: 0,
            cycle: self.cycle.next(),
        }
    }

    /// Start a new cycle on `topic`
    #[must_use]
    pub fn with_topic(&self, topic: Topic) -> Self {
        Self {
            state: SessionState::TopicChosen { topic },
            quiz_count: 0,
            cycle: self.cycle.next(),
        }
    }
}

// ============================================================================
// Session Context
// ============================================================================

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: UserId,
    pub max_quizzes: u32,
    pub advance_delay: Duration,
}

impl SessionContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            max_quizzes: MAX_QUIZZES,
            advance_delay: ADVANCE_DELAY,
        }
    }

    #[must_use]
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_quizzes(mut self, max_quizzes: u32) -> Self {
        self.max_quizzes = max_quizzes;
        self
    }
}
