//! Repository Ports - 出站端口
//!
//! 定义书库和阅读位置持久化的抽象接口
//! 具体实现在 infrastructure 层（Sled）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::book::{Book, BookId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Book Repository
// ============================================================================

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存书籍（覆盖同 ID）
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书籍
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 获取所有书籍（按创建时间排序）
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// 删除书籍
    async fn delete(&self, id: BookId) -> Result<(), RepositoryError>;
}

// ============================================================================
// Position Store
// ============================================================================

/// 阅读位置持久化错误（只记录日志，从不影响播放）
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for PersistenceError {
    fn from(err: RepositoryError) -> Self {
        PersistenceError::Storage(err.to_string())
    }
}

/// Position Store Port
///
/// 尽力而为，不在播放关键路径上
#[async_trait]
pub trait PositionStorePort: Send + Sync {
    /// 保存当前片段索引
    async fn save_position(&self, book_id: BookId, index: usize) -> Result<(), PersistenceError>;

    /// 读取上次的片段索引
    async fn load_position(&self, book_id: BookId) -> Result<usize, PersistenceError>;
}
