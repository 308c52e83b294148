//! Effects produced by state transitions

use crate::quiz::{OptionLabel, Quiz, Topic};
use crate::state_machine::state::CycleToken;
use std::time::Duration;

/// User-visible outputs of the state machine.
///
/// Transport-neutral; the adapter decides how each one looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Greeting plus the topic picker
    Welcome,
    /// A topic cycle has started
    TopicStarted { topic: Topic },
    /// A new quiz to answer
    Question { quiz: Quiz, number: u32, max: u32 },
    /// Grading result for the last quiz
    Verdict {
        correct: bool,
        correct_answer: OptionLabel,
        explanation: String,
        next_in: Duration,
    },
    /// The cycle hit its quiz cap
    CapReached { max: u32 },
    /// The generator failed; the user may pick a topic again
    GenerationFailed,
    /// The cycle was stopped
    Stopped,
    /// Answer received before any topic was chosen
    ChooseTopicFirst,
    /// Answer received while no quiz was waiting
    NoActiveQuiz,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Ask the generator for a quiz on `topic`
    RequestQuiz { topic: Topic, cycle: CycleToken },

    /// Fire `AdvanceDue { cycle }` after `delay`
    ScheduleAdvance { delay: Duration, cycle: CycleToken },

    /// Send a new message
    Send(Reply),

    /// Replace the message that carried the triggering control, or send a new
    /// one when there is none
    EditOrigin(Reply),
}

impl Effect {
    pub fn send(reply: Reply) -> Self {
        Effect::Send(reply)
    }

    pub fn edit_origin(reply: Reply) -> Self {
        Effect::EditOrigin(reply)
    }

    pub fn request_quiz(topic: Topic, cycle: CycleToken) -> Self {
        Effect::RequestQuiz { topic, cycle }
    }
}
