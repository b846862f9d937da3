//! Sled-based Library Store Implementation
//!
//! 书籍以 bincode 序列化存储在 `book:{id}` 键下，阅读位置随书籍记录一起保存。

use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{
    BookRepositoryPort, PersistenceError, PositionStorePort, RepositoryError,
};
use crate::domain::book::{Book, BookId};

/// Sled 书库配置
#[derive(Debug, Clone)]
pub struct SledLibraryConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledLibraryConfig {
    fn default() -> Self {
        Self {
            db_path: "data/library.sled".to_string(),
        }
    }
}

/// Sled 书库
pub struct SledLibraryStore {
    db: Db,
}

impl SledLibraryStore {
    pub fn new(config: &SledLibraryConfig) -> Result<Self, RepositoryError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            books = db.scan_prefix("book:").count(),
            "SledLibraryStore initialized"
        );

        Ok(Self { db })
    }

    /// 打开现有书库
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        Self::new(&SledLibraryConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 刷新到磁盘
    pub fn flush(&self) -> Result<(), RepositoryError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    fn key(id: BookId) -> String {
        format!("book:{}", id)
    }

    fn load(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        match self.db.get(Self::key(id)) {
            Ok(Some(data)) => bincode::deserialize(&data)
                .map(Some)
                .map_err(|e| RepositoryError::SerializationError(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(RepositoryError::DatabaseError(e.to_string())),
        }
    }

    fn store(&self, book: &Book) -> Result<(), RepositoryError> {
        let bytes = bincode::serialize(book)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        self.db
            .insert(Self::key(book.id()), bytes)
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BookRepositoryPort for SledLibraryStore {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        self.store(book)?;
        tracing::debug!(book_id = %book.id(), name = %book.name(), "Book saved");
        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        self.load(id)
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let mut books = Vec::new();
        for item in self.db.scan_prefix("book:") {
            let (key, value) = item.map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
            match bincode::deserialize::<Book>(&value) {
                Ok(book) => books.push(book),
                Err(e) => {
                    tracing::warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %e,
                        "Skipping unreadable book record"
                    );
                }
            }
        }
        books.sort_by_key(|book| book.created_at());
        Ok(books)
    }

    async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let removed = self
            .db
            .remove(Self::key(id))
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        match removed {
            Some(_) => {
                tracing::info!(book_id = %id, "Book deleted");
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl PositionStorePort for SledLibraryStore {
    /// 原子地改写书籍记录中的位置，记录不存在时保持不存在
    async fn save_position(&self, book_id: BookId, index: usize) -> Result<(), PersistenceError> {
        let mut failure = None;
        let previous = self
            .db
            .fetch_and_update(Self::key(book_id), |current| {
                let bytes = current?;
                let updated = bincode::deserialize::<Book>(bytes).and_then(|mut book| {
                    book.set_last_position(index);
                    bincode::serialize(&book)
                });
                match updated {
                    Ok(updated) => {
                        failure = None;
                        Some(updated)
                    }
                    Err(e) => {
                        failure = Some(RepositoryError::SerializationError(e.to_string()));
                        Some(bytes.to_vec())
                    }
                }
            })
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if let Some(e) = failure {
            return Err(e.into());
        }
        if previous.is_none() {
            return Err(PersistenceError::BookNotFound(book_id));
        }

        tracing::trace!(book_id = %book_id, index, "Reading position saved");
        Ok(())
    }

    async fn load_position(&self, book_id: BookId) -> Result<usize, PersistenceError> {
        self.load(book_id)?
            .map(|book| book.last_position())
            .ok_or(PersistenceError::BookNotFound(book_id))
    }
}
