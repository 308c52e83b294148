//! Events that drive a session

use crate::quiz::{Quiz, Topic};
use crate::state_machine::state::CycleToken;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Start,
    ChooseTopic {
        topic: Topic,
    },
    Stop,
    SubmitAnswer {
        text: String,
    },

    // Scheduler events
    /// The post-answer delay elapsed for the given cycle
    AdvanceDue {
        cycle: CycleToken,
    },

    // Generator events
    QuizGenerated {
        cycle: CycleToken,
        quiz: Quiz,
    },
    GenerationFailed {
        cycle: CycleToken,
        reason: String,
    },
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::ChooseTopic { .. } => "choose_topic",
            Event::Stop => "stop",
            Event::SubmitAnswer { .. } => "submit_answer",
            Event::AdvanceDue { .. } => "advance_due",
            Event::QuizGenerated { .. } => "quiz_generated",
            Event::GenerationFailed { .. } => "generation_failed",
        }
    }
}
