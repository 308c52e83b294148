//! Rendering of session replies to chat messages
//!
//! Bodies are Telegram HTML. Generated text (questions, options, explanations)
//! is escaped before it is embedded.

use super::inbound::payload;
use super::{Control, OutgoingMessage};
use crate::quiz::{Quiz, Topic};
use crate::state_machine::Reply;
use teloxide::utils::html::escape;

const START_HINT: &str = "नया क्विज़ शुरू करने के लिए /start कमांड का उपयोग करें.";
const STOP_LABEL: &str = "बंद करें";

pub fn render(reply: &Reply) -> OutgoingMessage {
    match reply {
        Reply::Welcome => OutgoingMessage::text(
            "नमस्ते! मैं एक AI-संचालित क्विज़ बॉट हूँ. आप किस विषय पर क्विज़ खेलना चाहेंगे?",
        )
        .with_controls(topic_picker()),

        Reply::TopicStarted { topic } => OutgoingMessage::text(format!(
            "ठीक है, हम {} पर क्विज़ शुरू कर रहे हैं...",
            escape(topic.name())
        )),

        Reply::Question { quiz, number, max } => question(quiz, *number, *max),

        Reply::Verdict {
            correct,
            correct_answer,
            explanation,
            next_in,
        } => {
            let explanation = escape(explanation);
            let headline = if *correct {
                "सही जवाब! 🎉".to_string()
            } else {
                format!("ग़लत जवाब! 😔\nसही जवाब था: <b>{correct_answer}</b>")
            };
            OutgoingMessage::text(format!(
                "{headline}\n\n<b>व्याख्या:</b> {explanation}\n\n<i>अगला सवाल {} सेकंड में...</i>",
                next_in.as_secs()
            ))
        }

        Reply::CapReached { max } => {
            OutgoingMessage::text(format!("आप {max} क्विज़ पूरे कर चुके हैं. {START_HINT}"))
        }

        Reply::GenerationFailed => OutgoingMessage::text(
            "माफ़ कीजिए, क्विज़ जनरेट करने में कोई समस्या हुई. फिर से कोशिश करने के लिए एक विषय चुनें.",
        )
        .with_controls(topic_picker()),

        Reply::Stopped => OutgoingMessage::text(format!("क्विज़ बंद कर दिया गया है. {START_HINT}")),

        Reply::ChooseTopicFirst => OutgoingMessage::text("कृपया पहले /start कमांड से एक विषय चुनें."),

        Reply::NoActiveQuiz => {
            OutgoingMessage::text("अभी कोई सवाल खुला नहीं है. कृपया अगले सवाल का इंतज़ार करें.")
        }
    }
}

fn question(quiz: &Quiz, number: u32, max: u32) -> OutgoingMessage {
    let mut text = format!(
        "<b>सवाल {number}/{max}:</b> {}\n\n",
        escape(quiz.question())
    );
    for (label, option) in quiz.options() {
        text.push_str(&format!("<b>{label}:</b> {}\n", escape(option)));
    }
    OutgoingMessage::text(text).with_controls(vec![Control::new(STOP_LABEL, payload::STOP)])
}

/// One control per topic, in picker order
pub fn topic_picker() -> Vec<Control> {
    Topic::ALL
        .into_iter()
        .map(|topic| Control::new(topic.name(), payload::topic(topic)))
        .collect()
}
