//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, PlaybackConfig, TtsEngineKind};
use crate::application::ControllerConfig;
use crate::domain::playback::{PlaybackRate, VoiceId};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 预取窗口上限
const MAX_PREFETCH_WINDOW: usize = 16;

/// 加载应用配置
///
/// # 环境变量示例
/// - `READALOUD_SERVER__PORT=8080`
/// - `READALOUD_TTS__API_KEY=...`
/// - `READALOUD_PLAYBACK__PREFETCH_WINDOW=5`
/// - `READALOUD_AUDIO__OUTPUT=device`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("server.max_upload_bytes", 20 * 1024 * 1024)?
        .set_default("tts.engine", "gemini")?
        .set_default("tts.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("tts.model", "gemini-2.5-flash-preview-tts")?
        .set_default("tts.timeout_secs", 60)?
        .set_default("tts.sample_rate", 24_000)?
        .set_default("playback.prefetch_window", 3)?
        .set_default("playback.default_voice", "Kore")?
        .set_default("playback.default_rate", 1.0)?
        .set_default("storage.library_path", "data/library.sled")?
        .set_default("audio.output", "clock")?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: READALOUD_，层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("READALOUD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 播放配置转换为控制器配置
pub fn controller_config(config: &PlaybackConfig) -> Result<ControllerConfig, ConfigError> {
    let voice = VoiceId::from_catalogue(&config.default_voice).ok_or_else(|| {
        ConfigError::ValidationError(format!("Unknown default voice: {}", config.default_voice))
    })?;
    let rate = PlaybackRate::new(config.default_rate)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(ControllerConfig {
        prefetch_window: config.prefetch_window,
        voice,
        rate,
    })
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.engine == TtsEngineKind::Gemini && config.tts.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS base URL cannot be empty".to_string(),
        ));
    }

    if config.tts.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "TTS sample rate cannot be 0".to_string(),
        ));
    }

    if !(1..=MAX_PREFETCH_WINDOW).contains(&config.playback.prefetch_window) {
        return Err(ConfigError::ValidationError(format!(
            "Prefetch window must be between 1 and {}",
            MAX_PREFETCH_WINDOW
        )));
    }

    controller_config(&config.playback)?;

    if config.storage.library_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Library path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Max Upload: {} bytes", config.server.max_upload_bytes);
    tracing::info!("TTS Engine: {:?}", config.tts.engine);
    if config.tts.engine == TtsEngineKind::Gemini {
        tracing::info!("TTS URL: {}", config.tts.base_url);
        tracing::info!("TTS Model: {}", config.tts.model);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
        tracing::info!(
            "TTS API Key: {}",
            if config.tts.api_key.is_some() { "set" } else { "not set" }
        );
    }
    tracing::info!("Prefetch Window: {}", config.playback.prefetch_window);
    tracing::info!("Default Voice: {}", config.playback.default_voice);
    tracing::info!("Default Rate: {}", config.playback.default_rate);
    tracing::info!("Library: {:?}", config.storage.library_path);
    tracing::info!("Audio Output: {:?}", config.audio.output);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
