//! Pure state transition function

use super::{Effect, Event, Reply, Session, SessionContext, SessionState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Rejected transitions. The session is left untouched and the user gets
/// `guidance()` as the single reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Answer received before a topic was chosen")]
    NoTopic,
    #[error("Answer received while no quiz is awaiting an answer")]
    NoActiveQuiz,
}

impl TransitionError {
    pub fn guidance(&self) -> Reply {
        match self {
            TransitionError::NoTopic => Reply::ChooseTopicFirst,
            TransitionError::NoActiveQuiz => Reply::NoActiveQuiz,
        }
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    session: &Session,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&session.state, event) {
        // ============================================================
        // Cycle control
        // ============================================================

        // Any + Start -> Idle
        (_, Event::Start) => {
            Ok(TransitionResult::new(session.reset()).with_effect(Effect::send(Reply::Welcome)))
        }

        // Any + ChooseTopic -> TopicChosen, then issue the first quiz
        (_, Event::ChooseTopic { topic }) => {
            let next = session.with_topic(topic);
            let issue = issue_quiz(&next, context);
            Ok(TransitionResult::new(issue.new_session)
                .with_effect(Effect::edit_origin(Reply::TopicStarted { topic }))
                .with_effects(issue.effects))
        }

        // Any + Stop -> Idle
        (_, Event::Stop) => {
            Ok(TransitionResult::new(session.reset()).with_effect(Effect::edit_origin(Reply::Stopped)))
        }

        // ============================================================
        // Answering
        // ============================================================

        // AwaitingAnswer + SubmitAnswer -> TopicChosen, next quiz after the delay
        (SessionState::AwaitingAnswer { topic, quiz }, Event::SubmitAnswer { text }) => {
            let verdict = Reply::Verdict {
                correct: quiz.is_correct(&text),
                correct_answer: quiz.correct_answer(),
                explanation: quiz.explanation().to_string(),
                next_in: context.advance_delay,
            };
            let next = Session {
                state: SessionState::TopicChosen { topic: *topic },
                quiz_count: session.quiz_count,
                cycle: session.cycle,
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::send(verdict))
                .with_effect(Effect::ScheduleAdvance {
                    delay: context.advance_delay,
                    cycle: session.cycle,
                }))
        }

        (SessionState::Idle, Event::SubmitAnswer { .. }) => Err(TransitionError::NoTopic),

        (SessionState::TopicChosen { .. }, Event::SubmitAnswer { .. }) => {
            Err(TransitionError::NoActiveQuiz)
        }

        // ============================================================
        // Scheduled advance
        // ============================================================

        // Scheduled under a cycle that has since ended
        (_, Event::AdvanceDue { cycle }) if cycle != session.cycle => {
            Ok(TransitionResult::new(session.clone()))
        }

        (SessionState::TopicChosen { .. }, Event::AdvanceDue { .. }) => {
            Ok(issue_quiz(session, context))
        }

        // A quiz is already out (or there is no topic): nothing to issue
        (_, Event::AdvanceDue { .. }) => Ok(TransitionResult::new(session.clone())),

        // ============================================================
        // Generator results
        // ============================================================

        (_, Event::QuizGenerated { cycle, .. } | Event::GenerationFailed { cycle, .. })
            if cycle != session.cycle =>
        {
            Ok(TransitionResult::new(session.clone()))
        }

        // TopicChosen + QuizGenerated -> AwaitingAnswer
        (SessionState::TopicChosen { topic }, Event::QuizGenerated { quiz, .. }) => {
            if session.quiz_count >= context.max_quizzes {
                return Ok(TransitionResult::new(session.clone()).with_effect(Effect::send(
                    Reply::CapReached {
                        max: context.max_quizzes,
                    },
                )));
            }
            let number = session.quiz_count + 1;
            let next = Session {
                state: SessionState::AwaitingAnswer {
                    topic: *topic,
                    quiz: quiz.clone(),
                },
                quiz_count: number,
                cycle: session.cycle,
            };
            Ok(TransitionResult::new(next).with_effect(Effect::send(Reply::Question {
                quiz,
                number,
                max: context.max_quizzes,
            })))
        }

        // TopicChosen + GenerationFailed -> TopicChosen (unchanged)
        (SessionState::TopicChosen { .. }, Event::GenerationFailed { .. }) => {
            Ok(TransitionResult::new(session.clone())
                .with_effect(Effect::send(Reply::GenerationFailed)))
        }

        // Result for a request this session is no longer waiting on
        (_, Event::QuizGenerated { .. } | Event::GenerationFailed { .. }) => {
            Ok(TransitionResult::new(session.clone()))
        }
    }
}

/// IssueQuiz: request a quiz unless the cycle is at its cap
fn issue_quiz(session: &Session, context: &SessionContext) -> TransitionResult {
    let Some(topic) = session.current_topic() else {
        return TransitionResult::new(session.clone());
    };

    if session.quiz_count >= context.max_quizzes {
        return TransitionResult::new(session.clone()).with_effect(Effect::send(
            Reply::CapReached {
                max: context.max_quizzes,
            },
        ));
    }

    TransitionResult::new(session.clone()).with_effect(Effect::request_quiz(topic, session.cycle))
}
