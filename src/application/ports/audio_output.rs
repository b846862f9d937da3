//! Audio Output Port - 音频播放抽象
//!
//! 挂载一个音频资源并开始播放。自然播放结束通过 oneshot 通知，
//! 由控制器的状态机消费，播放器本身从不驱动状态转换。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::application::playback::AudioResource;
use crate::domain::playback::PlaybackRate;

/// 播放资源错误
#[derive(Debug, Error)]
pub enum AudioOutputError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Audio resource cannot be decoded: {0}")]
    InvalidResource(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// 一次播放的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// 自然播放到结尾
    Finished,
    /// 播放过程中出错
    Failed(String),
}

/// 正在播放的音频的控制句柄
pub trait PlaybackControl: Send {
    /// 暂停，保留资源和播放位置
    fn pause(&mut self);

    /// 从暂停位置继续
    fn resume(&mut self) -> Result<(), AudioOutputError>;

    /// 立即作用于当前音频
    fn set_rate(&mut self, rate: PlaybackRate);

    /// 停止并卸载资源，之后不再发出完成通知
    fn halt(&mut self);
}

/// 已挂载的音频
pub struct ActivePlayback {
    pub control: Box<dyn PlaybackControl>,
    pub finished: oneshot::Receiver<PlaybackOutcome>,
}

impl std::fmt::Debug for ActivePlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivePlayback").finish_non_exhaustive()
    }
}

/// Audio Output Port
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    /// 挂载资源并开始播放
    async fn start(
        &self,
        resource: AudioResource,
        rate: PlaybackRate,
    ) -> Result<ActivePlayback, AudioOutputError>;
}
