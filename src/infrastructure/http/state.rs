//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    AddBookHandler, CloseReaderHandler, DeleteBookHandler, OpenReaderHandler,
    // Query handlers
    GetBookHandler, GetReaderChunksHandler, GetReaderStateHandler, ListBooksHandler,
    ListVoicesHandler,
    // Ports
    BookRepositoryPort, ReaderRegistryPort, TextExtractorPort, TtsEnginePort,
    // Playback
    ControllerConfig, PlaybackDeps,
};

/// 应用状态
///
/// 阅读会话登记在内存中，书库和阅读位置由持久化适配器保存
pub struct AppState {
    // ========== Ports ==========
    pub registry: Arc<dyn ReaderRegistryPort>,
    pub tts_engine: Arc<dyn TtsEnginePort>,

    // ========== Command Handlers ==========
    pub add_book_handler: AddBookHandler,
    pub delete_book_handler: DeleteBookHandler,
    pub open_reader_handler: OpenReaderHandler,
    pub close_reader_handler: CloseReaderHandler,

    // ========== Query Handlers ==========
    pub get_book_handler: GetBookHandler,
    pub list_books_handler: ListBooksHandler,
    pub get_reader_state_handler: GetReaderStateHandler,
    pub get_reader_chunks_handler: GetReaderChunksHandler,
    pub list_voices_handler: ListVoicesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        extractor: Arc<dyn TextExtractorPort>,
        registry: Arc<dyn ReaderRegistryPort>,
        deps: PlaybackDeps,
        config: ControllerConfig,
    ) -> Self {
        Self {
            // Ports
            registry: registry.clone(),
            tts_engine: deps.tts.clone(),

            // Command handlers
            add_book_handler: AddBookHandler::new(book_repo.clone(), extractor),
            delete_book_handler: DeleteBookHandler::new(book_repo.clone(), registry.clone()),
            open_reader_handler: OpenReaderHandler::new(
                book_repo.clone(),
                registry.clone(),
                deps,
                config,
            ),
            close_reader_handler: CloseReaderHandler::new(registry.clone()),

            // Query handlers
            get_book_handler: GetBookHandler::new(book_repo.clone()),
            list_books_handler: ListBooksHandler::new(book_repo),
            get_reader_state_handler: GetReaderStateHandler::new(registry.clone()),
            get_reader_chunks_handler: GetReaderChunksHandler::new(registry),
            list_voices_handler: ListVoicesHandler::new(),
        }
    }
}
