//! Book Query Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::BookRepositoryPort;
use crate::application::queries::{GetBook, ListBooks};
use crate::domain::book::{Book, BookId};

// ============================================================================
// Response DTOs
// ============================================================================

/// 书籍详情响应
#[derive(Debug, Clone)]
pub struct BookResponse {
    pub id: Uuid,
    pub name: String,
    pub thumbnail: Option<String>,
    pub chunk_count: usize,
    pub last_position: usize,
    pub created_at: String,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: *book.id().as_uuid(),
            name: book.name().to_string(),
            thumbnail: book.thumbnail().map(str::to_string),
            chunk_count: book.chunks().len(),
            last_position: book.last_position(),
            created_at: book.created_at().to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetBook Handler
pub struct GetBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: GetBook) -> Result<BookResponse, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(BookId::from_uuid(query.book_id))
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        Ok(BookResponse::from(&book))
    }
}

/// ListBooks Handler
pub struct ListBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, _query: ListBooks) -> Result<Vec<BookResponse>, ApplicationError> {
        let books = self.book_repo.find_all().await?;
        Ok(books.iter().map(BookResponse::from).collect())
    }
}
