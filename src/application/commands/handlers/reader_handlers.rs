//! Reader Command Handlers - 打开/关闭阅读会话
//!
//! 同一时间只有一个阅读会话，打开新书会先关闭旧会话（回到书库）。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::commands::{CloseReader, OpenReader};
use crate::application::error::ApplicationError;
use crate::application::playback::{
    spawn_session, ControllerConfig, PlaybackController, PlaybackDeps, SessionHandle,
};
use crate::application::ports::{BookRepositoryPort, ReaderRegistryPort};
use crate::domain::book::BookId;

/// 打开书籍响应
#[derive(Debug, Clone)]
pub struct OpenReaderResponse {
    pub session: SessionHandle,
    pub name: String,
}

/// OpenReader Handler
pub struct OpenReaderHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    registry: Arc<dyn ReaderRegistryPort>,
    deps: PlaybackDeps,
    config: ControllerConfig,
    opening: Mutex<()>,
}

impl OpenReaderHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        registry: Arc<dyn ReaderRegistryPort>,
        deps: PlaybackDeps,
        config: ControllerConfig,
    ) -> Self {
        Self {
            book_repo,
            registry,
            deps,
            config,
            opening: Mutex::new(()),
        }
    }

    pub async fn handle(&self, command: OpenReader) -> Result<OpenReaderResponse, ApplicationError> {
        let _opening = self.opening.lock().await;

        let book_id = BookId::from_uuid(command.book_id);
        let book = self
            .book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let chunks = book.chunks();
        if chunks.is_empty() {
            return Err(ApplicationError::validation("book has no readable text"));
        }

        // 回到书库：旧会话释放全部资源
        for session in self.registry.drain() {
            session.close().await;
            tracing::info!(session_id = %session.id(), "Previous reader session closed");
        }

        let start_index = match self.deps.positions.load_position(book_id).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(book_id = %book_id, error = %e, "Failed to load reading position");
                0
            }
        };

        let controller = PlaybackController::new(
            book_id,
            chunks,
            start_index,
            self.config.clone(),
            self.deps.clone(),
        );
        let session = spawn_session(controller);

        self.registry
            .register(session.clone())
            .map_err(|e| ApplicationError::internal(e.to_string()))?;

        tracing::info!(
            session_id = %session.id(),
            book_id = %book_id,
            start_index = session.snapshot().current_index,
            "Reader opened"
        );

        Ok(OpenReaderResponse {
            session,
            name: book.name().to_string(),
        })
    }
}

/// CloseReader Handler
pub struct CloseReaderHandler {
    registry: Arc<dyn ReaderRegistryPort>,
}

impl CloseReaderHandler {
    pub fn new(registry: Arc<dyn ReaderRegistryPort>) -> Self {
        Self { registry }
    }

    /// 返回被关闭的会话数
    pub async fn handle(&self, command: CloseReader) -> Result<usize, ApplicationError> {
        let sessions = match command.session_id {
            Some(session_id) => {
                let session = self.registry.remove(&session_id).map_err(|_| {
                    ApplicationError::validation(format!("Session not found: {}", session_id))
                })?;
                vec![session]
            }
            None => self.registry.drain(),
        };

        for session in &sessions {
            session.close().await;
            tracing::info!(session_id = %session.id(), "Reader closed");
        }

        Ok(sessions.len())
    }
}
