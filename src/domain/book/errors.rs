//! Book Context - Errors

use thiserror::Error;

use super::BookId;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Book not found: {0}")]
    NotFound(BookId),

    #[error("Invalid book name: {0}")]
    InvalidName(String),

    #[error("Book has no readable text")]
    EmptyText,
}
