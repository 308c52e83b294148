//! Quiz domain: topics, validated quiz items and their generator

mod generator;
mod types;


pub use generator::{GenerationError, QuizGenerator};
pub use types::{OptionLabel, Quiz, QuizError, Topic};

#[cfg(test)]
pub use types::{MAX_EXPLANATION_CHARS, MAX_OPTION_CHARS, MAX_QUESTION_CHARS};
