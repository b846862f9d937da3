//! Reader Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::playback::SessionHandle;
use crate::application::ports::ReaderRegistryPort;
use crate::application::queries::{GetReaderChunks, GetReaderState, ListVoices};
use crate::domain::playback::{PlaybackSnapshot, VoiceInfo, VOICE_CATALOGUE};
use crate::domain::TextChunk;

fn active_session(registry: &dyn ReaderRegistryPort) -> Result<SessionHandle, ApplicationError> {
    registry
        .active()
        .ok_or_else(|| ApplicationError::invalid_state("no book is open in the reader"))
}

/// 播放状态响应
#[derive(Debug, Clone)]
pub struct ReaderStateResponse {
    pub session_id: String,
    pub snapshot: PlaybackSnapshot,
}

/// GetReaderState Handler
pub struct GetReaderStateHandler {
    registry: Arc<dyn ReaderRegistryPort>,
}

impl GetReaderStateHandler {
    pub fn new(registry: Arc<dyn ReaderRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, _query: GetReaderState) -> Result<ReaderStateResponse, ApplicationError> {
        let session = active_session(self.registry.as_ref())?;
        Ok(ReaderStateResponse {
            session_id: session.id().to_string(),
            snapshot: session.snapshot(),
        })
    }
}

/// GetReaderChunks Handler
pub struct GetReaderChunksHandler {
    registry: Arc<dyn ReaderRegistryPort>,
}

impl GetReaderChunksHandler {
    pub fn new(registry: Arc<dyn ReaderRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, query: GetReaderChunks) -> Result<Vec<TextChunk>, ApplicationError> {
        let session = active_session(self.registry.as_ref())?;
        let start = query.start_index.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(session
            .chunks()
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// ListVoices Handler
#[derive(Default)]
pub struct ListVoicesHandler;

impl ListVoicesHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, _query: ListVoices) -> Vec<VoiceInfo> {
        VOICE_CATALOGUE.to_vec()
    }
}
