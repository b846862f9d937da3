//! Gemini TTS Client - 调用 Gemini generateContent 语音合成
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST {base_url}/v1beta/models/{model}:generateContent
//! Request: contents + generationConfig(responseModalities=AUDIO, prebuilt voice)  (JSON)
//! Response: candidates[0].content.parts[0].inlineData.data = base64 PCM (16-bit, mono)

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    SynthesisError, SynthesisRequest, SynthesizedSpeech, TtsEnginePort, TTS_SAMPLE_RATE,
};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

// ============================================================================
// Client
// ============================================================================

/// Gemini TTS 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiTtsClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// API Key（未配置时合成直接失败）
    pub api_key: Option<String>,
    /// TTS 模型
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// mime type 未携带采样率时使用
    pub sample_rate: u32,
}

impl Default for GeminiTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            model: "gemini-2.5-flash-preview-tts".to_string(),
            timeout_secs: 60,
            sample_rate: TTS_SAMPLE_RATE,
        }
    }
}

impl GeminiTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Gemini TTS 客户端
pub struct GeminiTtsClient {
    client: Client,
    config: GeminiTtsClientConfig,
}

impl GeminiTtsClient {
    /// 创建新的客户端
    pub fn new(config: GeminiTtsClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        if config.api_key.as_deref().map_or(true, str::is_empty) {
            tracing::warn!("TTS API key not configured; synthesis will fail");
        }

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// 获取模型信息 URL（健康检查）
    fn model_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key(&self) -> Result<&str, SynthesisError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(SynthesisError::MissingCredentials)
    }
}

/// 从 "audio/L16;codec=pcm;rate=24000" 中读取采样率
fn sample_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

fn decode_inline_audio(
    response: GenerateContentResponse,
    default_rate: u32,
) -> Result<SynthesizedSpeech, SynthesisError> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .ok_or_else(|| SynthesisError::InvalidResponse("no inline audio data".to_string()))?;

    let pcm = BASE64
        .decode(inline.data.as_bytes())
        .map_err(|e| SynthesisError::InvalidResponse(format!("invalid base64 audio: {}", e)))?;

    if pcm.is_empty() {
        return Err(SynthesisError::InvalidResponse("empty audio data".to_string()));
    }

    Ok(SynthesizedSpeech {
        pcm,
        sample_rate: sample_rate_from_mime(&inline.mime_type).unwrap_or(default_rate),
        channels: 1,
    })
}

#[async_trait]
impl TtsEnginePort for GeminiTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedSpeech, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        let api_key = self.api_key()?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: &request.text,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.voice.as_str(),
                        },
                    },
                },
            },
        };

        tracing::debug!(
            url = %self.generate_url(),
            text_len = request.text.len(),
            voice = %request.voice,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    SynthesisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

        let speech = decode_inline_audio(body, self.config.sample_rate)?;

        tracing::info!(
            voice = %request.voice,
            sample_rate = speech.sample_rate,
            audio_size = speech.pcm.len(),
            "TTS synthesis completed"
        );

        Ok(speech)
    }

    async fn health_check(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        match self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
