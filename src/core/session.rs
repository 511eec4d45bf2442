//! Per-chat conversation cursors.
//!
//! Sessions live only in memory and are lost on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingPayment,
    AwaitingName,
    AwaitingPhoto,
    AwaitingExpiry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: SessionState,
    pub draft_name: Option<String>,
    pub draft_photo_url: Option<String>,
    /// Approved payment that the proposal being drafted will consume.
    pub bound_payment: Option<Uuid>,
}

impl Session {
    /// Drops any draft and moves to `state`.
    pub fn restart(&mut self, state: SessionState) {
        *self = Session {
            state,
            ..Session::default()
        };
    }

    pub fn reset(&mut self) {
        self.restart(SessionState::Idle);
    }
}

/// Chat id to session map. Each chat's session sits behind its own lock so a
/// handler can hold it across awaits without blocking other chats.
#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<i64, Arc<AsyncMutex<Session>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the session of `chat_id`, creating an idle one on first use.
    pub async fn lock(&self, chat_id: i64) -> OwnedMutexGuard<Session> {
        let entry = {
            let mut sessions = self
                .sessions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sessions.entry(chat_id).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Forgets the session of `chat_id` if it holds no draft and nobody else
    /// is holding or waiting for it.
    pub fn evict_idle(&self, chat_id: i64) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let idle = sessions.get(&chat_id).is_some_and(|entry| {
            Arc::strong_count(entry) == 1
                && entry
                    .try_lock()
                    .is_ok_and(|session| *session == Session::default())
        });
        if idle {
            sessions.remove(&chat_id);
        }
    }

    /// Snapshot of a chat's live session, if it has one.
    pub async fn get(&self, chat_id: i64) -> Option<Session> {
        let entry = {
            let sessions = self
                .sessions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sessions.get(&chat_id).cloned()
        }?;
        let session = entry.lock().await;
        Some(session.clone())
    }
}
