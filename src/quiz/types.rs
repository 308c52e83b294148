//! Quiz item and topic types

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Topics
// ============================================================================

/// The fixed set of quiz categories offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    History,
    Science,
    Geography,
    Art,
    Sports,
    Technology,
}

impl Topic {
    /// All topics in picker order
    pub const ALL: [Topic; 6] = [
        Topic::History,
        Topic::Science,
        Topic::Geography,
        Topic::Art,
        Topic::Sports,
        Topic::Technology,
    ];

    /// Display name shown to users and embedded in the generation prompt
    pub fn name(self) -> &'static str {
        match self {
            Topic::History => "इतिहास",
            Topic::Science => "विज्ञान",
            Topic::Geography => "भूगोल",
            Topic::Art => "कला",
            Topic::Sports => "खेल",
            Topic::Technology => "प्रौद्योगिकी",
        }
    }

    /// Stable ASCII identifier used in control payloads
    pub fn slug(self) -> &'static str {
        match self {
            Topic::History => "history",
            Topic::Science => "science",
            Topic::Geography => "geography",
            Topic::Art => "art",
            Topic::Sports => "sports",
            Topic::Technology => "technology",
        }
    }

    /// Look up a topic by slug or display name
    pub fn parse(value: &str) -> Option<Topic> {
        let value = value.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(value) || t.name() == value)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Option labels
// ============================================================================

/// One of the four answer labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    /// Parse a label, ignoring surrounding whitespace and case.
    ///
    /// Only a single bare label matches: `" b "` is `B`, `"b)"` or `"AB"` is `None`.
    pub fn parse(value: &str) -> Option<OptionLabel> {
        match value.trim().to_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Quiz
// ============================================================================

/// Longest question accepted, in characters
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Longest option text accepted, in characters
pub const MAX_OPTION_CHARS: usize = 200;

/// Longest explanation accepted, in characters
pub const MAX_EXPLANATION_CHARS: usize = 2000;

/// Field-level reasons a generated quiz is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("explanation is empty")]
    EmptyExplanation,
    #[error("option {0} is missing")]
    MissingOption(OptionLabel),
    #[error("option {0} is empty")]
    EmptyOption(OptionLabel),
    #[error("question is longer than {} characters", MAX_QUESTION_CHARS)]
    QuestionTooLong,
    #[error("option {0} is longer than {} characters", MAX_OPTION_CHARS)]
    OptionTooLong(OptionLabel),
    #[error("explanation is longer than {} characters", MAX_EXPLANATION_CHARS)]
    ExplanationTooLong,
    #[error("option {0} appears more than once")]
    DuplicateOption(OptionLabel),
    #[error("unexpected option label {0:?}")]
    UnknownOptionLabel(String),
    #[error("correct answer {0:?} is not one of A-D")]
    InvalidCorrectAnswer(String),
}

/// A single validated quiz item.
///
/// Fields are private: a `Quiz` only exists once every field has been checked,
/// and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    question: String,
    options: [String; 4],
    correct_answer: OptionLabel,
    explanation: String,
}

impl Quiz {
    pub fn new(
        question: impl Into<String>,
        options: [String; 4],
        correct_answer: OptionLabel,
        explanation: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let question = question.into().trim().to_string();
        let explanation = explanation.into().trim().to_string();

        if question.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if explanation.is_empty() {
            return Err(QuizError::EmptyExplanation);
        }
        if question.chars().count() > MAX_QUESTION_CHARS {
            return Err(QuizError::QuestionTooLong);
        }
        if explanation.chars().count() > MAX_EXPLANATION_CHARS {
            return Err(QuizError::ExplanationTooLong);
        }

        let mut trimmed: [String; 4] = Default::default();
        for (label, text) in OptionLabel::ALL.into_iter().zip(options) {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(QuizError::EmptyOption(label));
            }
            if text.chars().count() > MAX_OPTION_CHARS {
                return Err(QuizError::OptionTooLong(label));
            }
            trimmed[label.index()] = text;
        }

        Ok(Self {
            question,
            options: trimmed,
            correct_answer,
            explanation,
        })
    }

    /// Validate the loosely-shaped payload produced by the backend
    pub(crate) fn from_raw(raw: RawQuiz) -> Result<Self, QuizError> {
        let correct_answer = OptionLabel::parse(&raw.correct_answer)
            .ok_or_else(|| QuizError::InvalidCorrectAnswer(raw.correct_answer.clone()))?;

        let mut slots: [Option<String>; 4] = Default::default();
        for (key, text) in raw.options {
            let label =
                OptionLabel::parse(&key).ok_or_else(|| QuizError::UnknownOptionLabel(key.clone()))?;
            if slots[label.index()].replace(text).is_some() {
                return Err(QuizError::DuplicateOption(label));
            }
        }

        let mut options: [String; 4] = Default::default();
        for label in OptionLabel::ALL {
            options[label.index()] = slots[label.index()]
                .take()
                .ok_or(QuizError::MissingOption(label))?;
        }

        Self::new(raw.question, options, correct_answer, raw.explanation)
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    /// Options in label order
    pub fn options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.option(label)))
    }

    pub fn correct_answer(&self) -> OptionLabel {
        self.correct_answer
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Grade a free-text reply: exact single-label match, case-insensitive
    pub fn is_correct(&self, reply: &str) -> bool {
        OptionLabel::parse(reply) == Some(self.correct_answer)
    }
}

/// Wire shape requested from the generation backend
#[derive(Debug, Deserialize)]
pub(crate) struct RawQuiz {
    pub question: String,
    #[serde(deserialize_with = "entries")]
    pub options: Vec<(String, String)>,
    pub correct_answer: String,
    pub explanation: String,
}

/// Read a JSON object as its key/value pairs in document order, keeping
/// repeated keys instead of letting the last one win
fn entries<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping option labels to text")
        }

        fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(4));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(Entries)
}
