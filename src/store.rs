//! In-memory session store
//!
//! Sessions live for the lifetime of the process; nothing is persisted.

use crate::runtime::SessionStore;
use crate::state_machine::{Session, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local `UserId -> Session` map
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users seen so far
    #[allow(dead_code)] // Diagnostics
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Session>> {
        // A panic while holding the lock cannot leave a half-written session:
        // every write replaces a whole value.
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user: UserId) -> Option<Session> {
        self.lock().get(&user).cloned()
    }

    async fn get_or_create(&self, user: UserId) -> Session {
        self.lock().entry(user).or_default().clone()
    }

    async fn update(&self, user: UserId, session: &Session) -> Result<(), String> {
        self.lock().insert(user, session.clone());
        Ok(())
    }

    async fn reset(&self, user: UserId) -> Result<(), String> {
        let mut sessions = self.lock();
        let session = sessions.entry(user).or_default();
        *session = session.reset();
        Ok(())
    }
}
