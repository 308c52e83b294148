//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::quiz::{GenerationError, Quiz, QuizGenerator, Topic};
use crate::state_machine::{ChatId, MessageRef, Session, UserId};
use crate::transport::OutgoingMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for per-user sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Session for `user`, if one exists
    async fn get(&self, user: UserId) -> Option<Session>;

    /// Session for `user`, creating an idle one on first contact
    async fn get_or_create(&self, user: UserId) -> Session;

    /// Replace the stored session
    async fn update(&self, user: UserId, session: &Session) -> Result<(), String>;

    /// Put the session back to idle under a fresh cycle
    async fn reset(&self, user: UserId) -> Result<(), String>;
}

/// Source of generated quiz items
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn generate(&self, topic: Topic) -> Result<Quiz, GenerationError>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait ChatOutbox: Send + Sync {
    /// Send a new message, with its inline controls
    async fn send_message(&self, chat: ChatId, message: &OutgoingMessage) -> Result<(), String>;

    /// Replace the text of an earlier message (its controls are dropped)
    async fn edit_message(&self, chat: ChatId, message: MessageRef, text: &str)
        -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, user: UserId) -> Option<Session> {
        (**self).get(user).await
    }

    async fn get_or_create(&self, user: UserId) -> Session {
        (**self).get_or_create(user).await
    }

    async fn update(&self, user: UserId, session: &Session) -> Result<(), String> {
        (**self).update(user, session).await
    }

    async fn reset(&self, user: UserId) -> Result<(), String> {
        (**self).reset(user).await
    }
}

#[async_trait]
impl<T: QuizSource + ?Sized> QuizSource for Arc<T> {
    async fn generate(&self, topic: Topic) -> Result<Quiz, GenerationError> {
        (**self).generate(topic).await
    }
}

#[async_trait]
impl<T: ChatOutbox + ?Sized> ChatOutbox for Arc<T> {
    async fn send_message(&self, chat: ChatId, message: &OutgoingMessage) -> Result<(), String> {
        (**self).send_message(chat, message).await
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), String> {
        (**self).edit_message(chat, message, text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl QuizSource for QuizGenerator {
    async fn generate(&self, topic: Topic) -> Result<Quiz, GenerationError> {
        QuizGenerator::generate(self, topic).await
    }
}
