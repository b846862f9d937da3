//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, BookId, BookName};
use crate::domain::text_segmenter::{segment_text, TextChunk};

/// Book 聚合根
///
/// 不变量:
/// - 提取出的文本至少能切出一个片段
/// - 文本入库后不可修改，只有阅读位置会变化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    name: BookName,
    text: String,
    thumbnail: Option<String>,
    last_position: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// 从提取出的文本创建书籍
    pub fn new(
        name: BookName,
        text: impl Into<String>,
        thumbnail: Option<String>,
    ) -> Result<Self, BookError> {
        let text = text.into();
        if segment_text(&text).is_empty() {
            return Err(BookError::EmptyText);
        }

        let now = Utc::now();
        Ok(Self {
            id: BookId::new(),
            name,
            text,
            thumbnail,
            last_position: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// 切分为可播放片段
    pub fn chunks(&self) -> Vec<TextChunk> {
        segment_text(&self.text)
    }

    pub fn set_last_position(&mut self, position: usize) {
        self.last_position = position;
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn name(&self) -> &BookName {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn last_position(&self) -> usize {
        self.last_position
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
