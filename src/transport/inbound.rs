//! Typed decoding of inbound transport events

use crate::quiz::Topic;
use crate::state_machine::Event;

/// Control payload encoding
pub mod payload {
    use crate::quiz::Topic;

    pub const TOPIC_PREFIX: &str = "topic:";
    pub const STOP: &str = "stop";

    pub fn topic(topic: Topic) -> String {
        format!("{TOPIC_PREFIX}{}", topic.slug())
    }
}

/// Decode a plain text message.
///
/// `/start` (optionally addressed as `/start@bot`, with or without arguments)
/// begins a session; other commands are ignored. Anything else is an answer.
pub fn decode_text(text: &str) -> Option<Event> {
    let trimmed = text.trim_start();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Some(Event::SubmitAnswer {
            text: text.to_string(),
        });
    };

    let name = command
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split('@')
        .next()
        .unwrap_or_default();

    if name.eq_ignore_ascii_case("start") {
        Some(Event::Start)
    } else {
        tracing::debug!(command = name, "Ignoring unknown command");
        None
    }
}

/// Decode the payload of a pressed inline control
pub fn decode_callback(data: &str) -> Option<Event> {
    let data = data.trim();
    if data == payload::STOP {
        return Some(Event::Stop);
    }

    let topic = data
        .strip_prefix(payload::TOPIC_PREFIX)
        .and_then(Topic::parse);
    match topic {
        Some(topic) => Some(Event::ChooseTopic { topic }),
        None => {
            tracing::warn!(payload = data, "Ignoring unknown callback payload");
            None
        }
    }
}
