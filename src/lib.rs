//! readaloud - 分段朗读系统
//!
//! 把书籍文本切分成句子片段，逐段调用语音合成服务并顺序播放，
//! 在当前片段之后预取固定窗口的音频，播放/暂停/跳转/停止都不会泄漏音频资源。
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 书籍与文本
//! - Playback Context: 播放状态、音色、语速
//! - text_segmenter: 句子切分
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, AudioOutput, TextExtractor, Repositories, ReaderRegistry）
//! - Playback: 播放引擎（音频缓存、预取调度、状态机、会话任务）
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: ReaderRegistry 内存实现
//! - Persistence: Sled 书库
//! - Adapters: Gemini/Fake TTS Client, 音频输出, 文本提取

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
