//! In-Memory Reader Registry Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::playback::SessionHandle;
use crate::application::ports::{ReaderRegistryPort, RegistryError};
use crate::domain::book::BookId;

/// 内存阅读会话登记表
pub struct InMemoryReaderRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl InMemoryReaderRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderRegistryPort for InMemoryReaderRegistry {
    fn register(&self, handle: SessionHandle) -> Result<String, RegistryError> {
        let session_id = handle.id().to_string();
        if self.sessions.contains_key(&session_id) {
            return Err(RegistryError::AlreadyExists(session_id));
        }
        tracing::info!(session_id = %session_id, book_id = %handle.book_id(), "Reader session registered");
        self.sessions.insert(session_id.clone(), handle);
        Ok(session_id)
    }

    fn get(&self, session_id: &str) -> Result<SessionHandle, RegistryError> {
        self.sessions
            .get(session_id)
            .map(|s| s.clone())
            .ok_or_else(|| RegistryError::NotFound(session_id.to_string()))
    }

    fn remove(&self, session_id: &str) -> Result<SessionHandle, RegistryError> {
        self.sessions
            .remove(session_id)
            .map(|(_, handle)| {
                tracing::debug!(session_id = %session_id, "Reader session removed");
                handle
            })
            .ok_or_else(|| RegistryError::NotFound(session_id.to_string()))
    }

    fn find_by_book(&self, book_id: BookId) -> Option<SessionHandle> {
        self.sessions
            .iter()
            .find(|entry| entry.book_id() == book_id)
            .map(|entry| entry.value().clone())
    }

    fn drain(&self) -> Vec<SessionHandle> {
        let ids = self.list_all();
        ids.iter()
            .filter_map(|id| self.sessions.remove(id).map(|(_, handle)| handle))
            .collect()
    }

    fn is_valid(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|s| !s.is_closed())
            .unwrap_or(false)
    }

    fn list_all(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}
