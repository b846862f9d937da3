//! 分段朗读播放引擎
//!
//! - resource / wav: 可播放音频资源
//! - audio_cache: 片段索引 → 资源
//! - pending: 合成中集合（去重）
//! - synthesis: 片段合成与前台获取
//! - prefetch: 预取窗口调度
//! - controller: 播放状态机
//! - session: 会话任务与句柄

mod audio_cache;
mod controller;
mod error;
mod pending;
mod prefetch;
mod resource;
mod session;
mod synthesis;
mod wav;

pub use audio_cache::AudioCache;
pub use controller::{
    ControllerConfig, PlaybackController, PlaybackDeps, PlaybackEvent, Transport,
    DEFAULT_PREFETCH_WINDOW,
};
pub use error::{PlaybackError, TransportError};
pub use pending::{ClaimKind, PendingGuard, PendingSet};
pub use prefetch::PrefetchScheduler;
pub use resource::{AudioResource, ResourceLedger};
pub use session::{spawn_session, ReaderCommand, SessionHandle};
pub use synthesis::ChunkSynthesizer;
pub use wav::pcm16_to_wav;
