//! Per-user quiz session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` maps (session, event) to a new session plus effects, and the
//! runtime performs the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Reply};
pub use event::Event;
pub use state::{
    ChatId, CycleToken, MessageRef, Session, SessionContext, SessionState, UserId,
    ADVANCE_DELAY, MAX_QUIZZES,
};
pub use transition::{transition, TransitionError, TransitionResult};
