//! Text Extractor Adapter - 文档文本提取实现

mod plain_text;

pub use plain_text::PlainTextExtractor;
