//! Chat transport adapter
//!
//! Decodes inbound chat traffic into session events and renders replies as
//! text plus inline controls. The Telegram binding lives in `telegram`.

mod inbound;
pub mod render;
mod telegram;

pub use inbound::{decode_callback, decode_text, payload};
pub use telegram::{run, TelegramOutbox};

/// A message ready for the chat, already rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// HTML body
    pub text: String,
    /// Inline controls, one per row
    pub controls: Vec<Control>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.controls = controls;
        self
    }
}

/// Inline control: a visible label and the payload sent back when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub payload: String,
}

impl Control {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}
