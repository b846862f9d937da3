//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Book Context: 书库中的书
//! - Playback Context: 朗读播放状态、音色、语速

pub mod book;
pub mod playback;

// 共享的文本分割器
mod text_segmenter;

pub use text_segmenter::{segment_text, TextChunk};
