//! Quiz generation through the text backend
//!
//! One backend call per quiz. Output is validated in full before a `Quiz` is
//! returned; anything malformed surfaces as a `GenerationError`.

use super::types::{
    Quiz, QuizError, RawQuiz, Topic, MAX_EXPLANATION_CHARS, MAX_OPTION_CHARS, MAX_QUESTION_CHARS,
};
use crate::llm::{LlmError, LlmRequest, LlmService};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

const MAX_OUTPUT_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 1.0;

/// Why a quiz could not be produced
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend failed: {0}")]
    Backend(#[from] LlmError),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend output is not a quiz object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("backend output failed validation: {0}")]
    Invalid(#[from] QuizError),
}

/// Produces one fresh quiz per call from the configured backend
pub struct QuizGenerator {
    llm: Arc<dyn LlmService>,
    timeout: Duration,
}

impl QuizGenerator {
    pub fn new(llm: Arc<dyn LlmService>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn generate(&self, topic: Topic) -> Result<Quiz, GenerationError> {
        let request = LlmRequest::prompt(build_prompt(topic))
            .with_max_tokens(MAX_OUTPUT_TOKENS)
            .with_temperature(TEMPERATURE)
            .with_json_output();

        let response = timeout(self.timeout, self.llm.complete(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let quiz = parse_quiz(&response.text())?;
        tracing::debug!(topic = topic.slug(), question = quiz.question(), "Quiz generated");
        Ok(quiz)
    }
}

/// Build the instruction prompt for a topic.
///
/// The shape example is part of the prompt so the backend mirrors the exact keys
/// `parse_quiz` expects.
pub fn build_prompt(topic: Topic) -> String {
    format!(
        r#"एक क्विज़ के लिए एक JSON ऑब्जेक्ट जनरेट करें जिसमें एक सवाल, चार विकल्प (A, B, C, D), सही उत्तर का अक्षर (A, B, C या D) और सही उत्तर की एक संक्षिप्त व्याख्या हो.
यह क्विज़ "{topic}" विषय पर होनी चाहिए.
उदाहरण:
{{
  "question": "मानव शरीर की सबसे बड़ी हड्डी कौन सी है?",
  "options": {{
    "A": "फ़ेमर",
    "B": "टिबिआ",
    "C": "फ़िबुला",
    "D": "ह्यूमरस"
  }},
  "correct_answer": "A",
  "explanation": "फ़ेमर, जिसे जाँघ की हड्डी भी कहते हैं, मानव शरीर की सबसे लंबी और सबसे मजबूत हड्डी है."
}}
सवाल {MAX_QUESTION_CHARS}, हर विकल्प {MAX_OPTION_CHARS} और व्याख्या {MAX_EXPLANATION_CHARS} अक्षरों से लंबी नहीं होनी चाहिए.
JSON में सिर्फ़ यही एक ऑब्जेक्ट होना चाहिए."#,
        topic = topic.name()
    )
}

/// Remove markdown code fences the backend sometimes wraps around JSON
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse and validate backend output into a `Quiz`
pub fn parse_quiz(text: &str) -> Result<Quiz, GenerationError> {
    let raw: RawQuiz = serde_json::from_str(&strip_code_fences(text))?;
    Ok(Quiz::from_raw(raw)?)
}
