//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_output;
mod reader_registry;
mod repositories;
mod text_extractor;
mod tts_engine;

pub use audio_output::{
    ActivePlayback, AudioOutputError, AudioOutputPort, PlaybackControl, PlaybackOutcome,
};
pub use reader_registry::{ReaderRegistryPort, RegistryError};
pub use repositories::{BookRepositoryPort, PersistenceError, PositionStorePort, RepositoryError};
pub use text_extractor::{Document, ExtractedDocument, ExtractionError, TextExtractorPort};
pub use tts_engine::{
    SynthesisError, SynthesisRequest, SynthesizedSpeech, TtsEnginePort, TTS_SAMPLE_RATE,
};
