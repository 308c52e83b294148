//! Runtime for per-user quiz sessions
//!
//! Each user gets one actor task that owns their session. Events for the
//! same user are applied in arrival order; different users never wait on
//! each other.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Envelope, SessionRuntime};
pub use traits::*;

use crate::quiz::QuizGenerator;
use crate::state_machine::{
    ChatId, Event, MessageRef, Session, SessionContext, UserId, ADVANCE_DELAY, MAX_QUIZZES,
};
use crate::store::InMemorySessionStore;
use crate::transport::TelegramOutbox;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Type alias for production manager with concrete implementations
pub type ProductionManager = SessionManager<InMemorySessionStore, QuizGenerator, TelegramOutbox>;

/// Tunables shared by every session
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    pub max_quizzes: u32,
    pub advance_delay: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_quizzes: MAX_QUIZZES,
            advance_delay: ADVANCE_DELAY,
        }
    }
}

/// Handle to interact with a running session actor
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Envelope>,
}

/// Manager for all session runtimes
pub struct SessionManager<S, Q, O>
where
    S: SessionStore + 'static,
    Q: QuizSource + 'static,
    O: ChatOutbox + 'static,
{
    store: Arc<S>,
    quiz_source: Arc<Q>,
    outbox: Arc<O>,
    settings: RuntimeSettings,
    runtimes: RwLock<HashMap<UserId, SessionHandle>>,
}

impl<S, Q, O> SessionManager<S, Q, O>
where
    S: SessionStore + 'static,
    Q: QuizSource + 'static,
    O: ChatOutbox + 'static,
{
    pub fn new(store: Arc<S>, quiz_source: Arc<Q>, outbox: Arc<O>, settings: RuntimeSettings) -> Self {
        Self {
            store,
            quiz_source,
            outbox,
            settings,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Get or start the actor for `user`
    pub async fn get_or_create(&self, user: UserId) -> SessionHandle {
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&user) {
                return handle.clone();
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another event for the same user may have won the race
        if let Some(handle) = runtimes.get(&user) {
            return handle.clone();
        }

        let context = SessionContext::new(user)
            .with_max_quizzes(self.settings.max_quizzes)
            .with_advance_delay(self.settings.advance_delay);

        let (event_tx, event_rx) = mpsc::channel(32);
        let runtime = SessionRuntime::new(
            context,
            self.store.clone(),
            self.quiz_source.clone(),
            self.outbox.clone(),
            event_rx,
            event_tx.clone(),
        );

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(user_id = %user, "Session runtime finished");
        });

        let handle = SessionHandle { event_tx };
        runtimes.insert(user, handle.clone());
        handle
    }

    /// Send an event to a user's session
    pub async fn dispatch(
        &self,
        user: UserId,
        chat: ChatId,
        event: Event,
        origin: Option<MessageRef>,
    ) -> Result<(), String> {
        let envelope = Envelope::new(event, chat).with_origin(origin);
        let handle = self.get_or_create(user).await;

        let envelope = match handle.event_tx.send(envelope).await {
            Ok(()) => return Ok(()),
            Err(mpsc::error::SendError(envelope)) => envelope,
        };

        // The actor is gone; start a fresh one and retry once
        tracing::warn!(user_id = %user, "Session runtime closed, restarting");
        self.runtimes.write().await.remove(&user);
        let handle = self.get_or_create(user).await;
        handle
            .event_tx
            .send(envelope)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Snapshot of a user's session
    #[allow(dead_code)] // Diagnostics and tests
    pub async fn session(&self, user: UserId) -> Option<Session> {
        self.store.get(user).await
    }
}
