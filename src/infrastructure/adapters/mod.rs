//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod audio;
pub mod extract;
pub mod tts;

pub use audio::*;
pub use extract::*;
pub use tts::*;
