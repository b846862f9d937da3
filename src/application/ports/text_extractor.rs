//! Text Extractor Port - 文档文本提取抽象
//!
//! 从上传的文档中提取全文和缩略图，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 提取错误（打开书籍时致命，不重试）
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("Document is not valid text: {0}")]
    InvalidEncoding(String),

    #[error("Document is empty")]
    Empty,

    #[error("IO error: {0}")]
    IoError(String),
}

/// 待提取的原始文档
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 提取结果
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    /// data URL 形式的缩略图（格式支持时才有）
    pub thumbnail: Option<String>,
}

/// Text Extractor Port
#[async_trait]
pub trait TextExtractorPort: Send + Sync {
    /// 提取全文和缩略图
    async fn extract(&self, document: Document) -> Result<ExtractedDocument, ExtractionError>;

    /// 是否支持该文档
    fn supports(&self, document: &Document) -> bool;
}
