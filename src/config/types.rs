//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传文档最大大小（字节）
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024 // 20 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// Gemini 语音合成服务
    #[default]
    Gemini,
    /// 本地静音合成（开发用）
    Fake,
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub engine: TtsEngineKind,

    /// 服务基础 URL
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    /// API 密钥，未配置时读取 GEMINI_API_KEY 环境变量
    #[serde(default)]
    pub api_key: Option<String>,

    /// 模型名称
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 返回 PCM 的采样率
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_tts_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_tts_timeout() -> u64 {
    60
}

fn default_sample_rate() -> u32 {
    24_000
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngineKind::default(),
            base_url: default_tts_base_url(),
            api_key: None,
            model: default_tts_model(),
            timeout_secs: default_tts_timeout(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 预取窗口（当前片段之后预先合成的片段数）
    #[serde(default = "default_prefetch_window")]
    pub prefetch_window: usize,

    /// 默认音色
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// 默认语速
    #[serde(default = "default_rate")]
    pub default_rate: f32,
}

fn default_prefetch_window() -> usize {
    3
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_rate() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            prefetch_window: default_prefetch_window(),
            default_voice: default_voice(),
            default_rate: default_rate(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 书库数据库路径
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("data/library.sled")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
        }
    }
}

/// 音频输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutputKind {
    /// 无设备，按时长计时
    #[default]
    Clock,
    /// 本地声卡（需要 device-audio feature）
    Device,
}

/// 音频输出配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub output: AudioOutputKind,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
