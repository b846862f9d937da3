//! Book Command Handlers

use std::path::Path;
use std::sync::Arc;

use crate::application::commands::{AddBook, DeleteBook};
use crate::application::error::ApplicationError;
use crate::application::ports::{BookRepositoryPort, ReaderRegistryPort, TextExtractorPort};
use crate::application::queries::handlers::BookResponse;
use crate::domain::book::{Book, BookId, BookName};

// ============================================================================
// AddBook
// ============================================================================

/// AddBook Handler - 提取文本并入库
pub struct AddBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    extractor: Arc<dyn TextExtractorPort>,
}

impl AddBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, extractor: Arc<dyn TextExtractorPort>) -> Self {
        Self {
            book_repo,
            extractor,
        }
    }

    pub async fn handle(&self, command: AddBook) -> Result<BookResponse, ApplicationError> {
        let AddBook { name, document } = command;

        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => Path::new(&document.file_name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(&document.file_name)
                .to_string(),
        };
        let name = BookName::new(name).map_err(ApplicationError::validation)?;

        if !self.extractor.supports(&document) {
            return Err(ApplicationError::validation(format!(
                "Unsupported document: {}",
                document.file_name
            )));
        }

        let file_name = document.file_name.clone();
        let extracted = self.extractor.extract(document).await?;
        let book = Book::new(name, extracted.text, extracted.thumbnail)?;

        self.book_repo.save(&book).await?;

        tracing::info!(
            book_id = %book.id(),
            name = %book.name(),
            file_name = %file_name,
            chunk_count = book.chunks().len(),
            "Book added"
        );

        Ok(BookResponse::from(&book))
    }
}

// ============================================================================
// DeleteBook
// ============================================================================

/// DeleteBook Handler - 正在阅读的书先关闭会话
pub struct DeleteBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    registry: Arc<dyn ReaderRegistryPort>,
}

impl DeleteBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, registry: Arc<dyn ReaderRegistryPort>) -> Self {
        Self {
            book_repo,
            registry,
        }
    }

    pub async fn handle(&self, command: DeleteBook) -> Result<(), ApplicationError> {
        let book_id = BookId::from_uuid(command.book_id);

        self.book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        if let Some(session) = self.registry.find_by_book(book_id) {
            if let Ok(session) = self.registry.remove(session.id()) {
                session.close().await;
                tracing::info!(session_id = %session.id(), "Closed reader session of deleted book");
            }
        }

        self.book_repo.delete(book_id).await?;

        tracing::info!(book_id = %book_id, "Book deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Document;
    use crate::application::testing::MemoryLibrary;
    use crate::infrastructure::adapters::extract::PlainTextExtractor;
    use crate::infrastructure::memory::InMemoryReaderRegistry;

    fn document(file_name: &str, text: &str) -> Document {
        Document {
            file_name: file_name.to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_add_book_uses_file_stem_as_name() {
        let library = Arc::new(MemoryLibrary::new());
        let handler = AddBookHandler::new(library.clone(), Arc::new(PlainTextExtractor::new()));

        let response = handler
            .handle(AddBook {
                name: None,
                document: document("memorias.txt", "First line.\nSecond line!"),
            })
            .await
            .unwrap();

        assert_eq!(response.name, "memorias");
        assert_eq!(response.chunk_count, 2);
        assert_eq!(library.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_book_rejects_blank_text() {
        let library = Arc::new(MemoryLibrary::new());
        let handler = AddBookHandler::new(library.clone(), Arc::new(PlainTextExtractor::new()));

        let result = handler
            .handle(AddBook {
                name: Some("Blank".to_string()),
                document: document("blank.txt", "  \n\n "),
            })
            .await;

        assert!(result.is_err());
        assert!(library.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_book_rejects_unsupported_document() {
        let handler = AddBookHandler::new(
            Arc::new(MemoryLibrary::new()),
            Arc::new(PlainTextExtractor::new()),
        );

        let result = handler
            .handle(AddBook {
                name: None,
                document: Document {
                    file_name: "scan.pdf".to_string(),
                    content_type: Some("application/pdf".to_string()),
                    bytes: vec![0x25, 0x50, 0x44, 0x46],
                },
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_book() {
        let handler = DeleteBookHandler::new(
            Arc::new(MemoryLibrary::new()),
            Arc::new(InMemoryReaderRegistry::new()),
        );
        let result = handler
            .handle(DeleteBook {
                book_id: uuid::Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }
}
