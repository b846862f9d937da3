//! readaloud - 分段朗读服务
//!
//! 启动顺序：配置 → 日志 → 书库 → 合成引擎 → 音频输出 → HTTP 服务

use std::sync::Arc;

use anyhow::Context;
use readaloud::application::{AudioOutputPort, PlaybackDeps, ReaderRegistryPort, TtsEnginePort};
use readaloud::config::{
    controller_config, load_config, print_config, AppConfig, AudioOutputKind, TtsEngineKind,
};
use readaloud::infrastructure::adapters::{
    ClockAudioOutput, FakeTtsClient, GeminiTtsClient, GeminiTtsClientConfig, PlainTextExtractor,
};
use readaloud::infrastructure::http::{AppState, HttpServer, ServerConfig};
use readaloud::infrastructure::memory::InMemoryReaderRegistry;
use readaloud::infrastructure::persistence::SledLibraryStore;

fn build_tts_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    match config.tts.engine {
        TtsEngineKind::Gemini => {
            let api_key = config
                .tts
                .api_key
                .clone()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok());
            if api_key.is_none() {
                tracing::warn!("No TTS API key configured, synthesis requests will fail");
            }

            let client_config = GeminiTtsClientConfig {
                base_url: config.tts.base_url.clone(),
                api_key,
                model: config.tts.model.clone(),
                timeout_secs: config.tts.timeout_secs,
                sample_rate: config.tts.sample_rate,
            };
            Ok(Arc::new(GeminiTtsClient::new(client_config)?))
        }
        TtsEngineKind::Fake => Ok(Arc::new(FakeTtsClient::with_defaults())),
    }
}

fn build_audio_output(config: &AppConfig) -> anyhow::Result<Arc<dyn AudioOutputPort>> {
    match config.audio.output {
        AudioOutputKind::Clock => Ok(Arc::new(ClockAudioOutput::new())),
        #[cfg(feature = "device-audio")]
        AudioOutputKind::Device => Ok(Arc::new(
            readaloud::infrastructure::adapters::RodioAudioOutput::new()?,
        )),
        #[cfg(not(feature = "device-audio"))]
        AudioOutputKind::Device => {
            anyhow::bail!("audio.output = \"device\" requires the `device-audio` feature")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().context("Failed to load config")?;

    // 初始化日志
    let log_filter = format!(
        "{},readaloud={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("readaloud - chunked read-aloud service");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = config.storage.library_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let library = Arc::new(SledLibraryStore::open(&config.storage.library_path)?);
    let registry = Arc::new(InMemoryReaderRegistry::new());

    let deps = PlaybackDeps {
        tts: build_tts_engine(&config)?,
        output: build_audio_output(&config)?,
        positions: library.clone(),
    };

    let state = Arc::new(AppState::new(
        library.clone(),
        Arc::new(PlainTextExtractor::new()),
        registry.clone(),
        deps,
        controller_config(&config.playback)?,
    ));

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 关闭阅读会话，最后的阅读位置随之写入
    for session in registry.drain() {
        session.close().await;
    }
    library.flush()?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
