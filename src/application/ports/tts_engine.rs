//! TTS Engine Port - 语音合成抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::VoiceId;

/// 合成服务输出的固定采样率（单声道 16-bit PCM）
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// TTS 错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Cannot synthesize empty text")]
    EmptyText,

    #[error("Synthesis credentials are not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 预置音色
    pub voice: VoiceId,
}

/// 合成结果：原始 PCM（16-bit little-endian）
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    pub pcm: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// TTS Engine Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 把文本合成为 PCM 音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedSpeech, SynthesisError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
