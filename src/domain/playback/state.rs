//! Playback Context - 播放状态

use serde::{Deserialize, Serialize};

use super::{PlaybackRate, VoiceId};
use crate::domain::book::BookId;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// 初始状态
    #[default]
    Idle,
    /// 正在播放（包括等待当前片段音频就绪）
    Playing,
    /// 已暂停，当前音频资源保留
    Paused,
    /// 已停止，所有资源已释放
    Stopped,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        }
    }
}

/// 一个阅读会话内唯一的权威播放状态
///
/// 不变量:
/// - current_index 在 [0, chunk_count] 内，chunk_count 表示已读完
/// - rate > 0
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub current_index: usize,
    pub rate: PlaybackRate,
    pub voice: VoiceId,
}

impl PlaybackState {
    pub fn new(start_index: usize, rate: PlaybackRate, voice: VoiceId) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            current_index: start_index,
            rate,
            voice,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

/// 对外只读的播放快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub book_id: BookId,
    pub status: PlaybackStatus,
    pub current_index: usize,
    pub chunk_count: usize,
    pub rate: f32,
    pub voice: String,
    /// 人类可读的进度信息
    pub message: String,
}
