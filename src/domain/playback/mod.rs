//! Playback Context - 朗读播放限界上下文
//!
//! 职责:
//! - 播放状态（状态 + 播放头）
//! - 音色与语速值对象

mod state;
mod value_objects;

pub use state::{PlaybackSnapshot, PlaybackState, PlaybackStatus};
pub use value_objects::{PlaybackRate, VoiceId, VoiceInfo, VOICE_CATALOGUE};
