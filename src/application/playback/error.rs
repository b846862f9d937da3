//! 播放引擎错误

use thiserror::Error;

use crate::application::ports::{
    AudioOutputError, ExtractionError, PersistenceError, SynthesisError,
};

/// 播放引擎错误分类
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// 打开书籍时致命
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// 当前片段的播放尝试失败
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// 音频资源无法播放
    #[error("Audio resource failed: {0}")]
    Resource(#[from] AudioOutputError),

    /// 只记录日志
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// 会话已停止，结果被丢弃
    #[error("Playback cancelled")]
    Cancelled,
}

impl PlaybackError {
    /// 展示给用户的状态信息
    pub fn status_message(&self) -> &'static str {
        match self {
            PlaybackError::Synthesis(SynthesisError::InvalidResponse(_)) => {
                "Failed to get audio for chunk."
            }
            PlaybackError::Synthesis(_) => "Error generating audio.",
            PlaybackError::Resource(_) => "Error playing audio.",
            PlaybackError::Extraction(_) => "Failed to load book.",
            PlaybackError::Persistence(_) | PlaybackError::Cancelled => "Stopped.",
        }
    }
}

/// 传输控制命令被拒绝
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Chunk index {index} out of range (chunk count: {chunk_count})")]
    InvalidIndex { index: usize, chunk_count: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Reader session is closed")]
    SessionClosed,
}
