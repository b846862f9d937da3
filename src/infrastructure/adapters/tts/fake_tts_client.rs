//! Fake TTS Client - 用于开发和测试的 TTS 客户端
//!
//! 不调用外部服务，按文本长度返回静音 PCM

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    SynthesisError, SynthesisRequest, SynthesizedSpeech, TtsEnginePort, TTS_SAMPLE_RATE,
};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符对应的音频时长（毫秒）
    pub ms_per_char: u64,
    /// 模拟合成延迟
    pub latency: Duration,
    /// 采样率
    pub sample_rate: u32,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            ms_per_char: 60,
            latency: Duration::from_millis(200),
            sample_rate: TTS_SAMPLE_RATE,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            ms_per_char = config.ms_per_char,
            latency_ms = config.latency.as_millis() as u64,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    fn pcm_len(&self, text: &str) -> usize {
        let millis = text.chars().count() as u64 * self.config.ms_per_char;
        let frames = self.config.sample_rate as u64 * millis / 1000;
        frames.max(1) as usize * 2
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedSpeech, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            "FakeTtsClient: returning silence"
        );

        // 模拟合成延迟
        tokio::time::sleep(self.config.latency).await;

        Ok(SynthesizedSpeech {
            pcm: vec![0u8; self.pcm_len(&request.text)],
            sample_rate: self.config.sample_rate,
            channels: 1,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}
