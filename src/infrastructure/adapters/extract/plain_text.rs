//! Plain Text Extractor - 纯文本文档提取
//!
//! 支持 UTF-8 编码的 .txt / .md 文档（或 text/* 内容类型），没有缩略图。

use async_trait::async_trait;

use crate::application::ports::{Document, ExtractedDocument, ExtractionError, TextExtractorPort};

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// 纯文本提取器
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extension(file_name: &str) -> Option<String> {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[async_trait]
impl TextExtractorPort for PlainTextExtractor {
    async fn extract(&self, document: Document) -> Result<ExtractedDocument, ExtractionError> {
        if !self.supports(&document) {
            return Err(ExtractionError::UnsupportedFormat(document.file_name));
        }

        let text = String::from_utf8(document.bytes)
            .map_err(|e| ExtractionError::InvalidEncoding(e.to_string()))?;

        // 去掉 BOM，统一换行
        let text = text
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        tracing::debug!(
            file_name = %document.file_name,
            text_len = text.len(),
            "Text extracted"
        );

        Ok(ExtractedDocument {
            text,
            thumbnail: None,
        })
    }

    fn supports(&self, document: &Document) -> bool {
        if let Some(content_type) = &document.content_type {
            if content_type.starts_with("text/") {
                return true;
            }
        }
        Self::extension(&document.file_name)
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}
