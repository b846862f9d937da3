//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioOutput、TextExtractor、Repository 等）
//! - playback: 分段朗读播放引擎（缓存、预取、状态机、会话）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod playback;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    // Book commands
    AddBook,
    DeleteBook,
    // Reader commands
    CloseReader,
    OpenReader,
    // Handlers
    handlers::{
        AddBookHandler, CloseReaderHandler, DeleteBookHandler, OpenReaderHandler,
        OpenReaderResponse,
    },
};

pub use error::ApplicationError;

pub use playback::{
    ControllerConfig, PlaybackDeps, PlaybackError, SessionHandle, TransportError,
};

pub use ports::{
    // Audio output
    AudioOutputError,
    AudioOutputPort,
    // Repositories
    BookRepositoryPort,
    PersistenceError,
    PositionStorePort,
    RepositoryError,
    // Reader registry
    ReaderRegistryPort,
    RegistryError,
    // Text extractor
    Document,
    ExtractionError,
    TextExtractorPort,
    // TTS engine
    SynthesisError,
    TtsEnginePort,
};

pub use queries::{
    // Book queries
    GetBook,
    ListBooks,
    // Reader queries
    GetReaderChunks,
    GetReaderState,
    ListVoices,
    // Handlers
    handlers::{
        BookResponse, GetBookHandler, GetReaderChunksHandler, GetReaderStateHandler,
        ListBooksHandler, ListVoicesHandler, ReaderStateResponse,
    },
};
