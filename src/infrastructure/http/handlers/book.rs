//! Book HTTP Handlers - 书库

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::{AddBook, DeleteBook, Document, GetBook, ListBooks};
use crate::infrastructure::http::dto::{ApiResponse, BookDto, BookIdRequest, DeletedDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传书籍（multipart 字段：file，可选 name）
pub async fn upload_book(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    let mut name: Option<String> = None;
    let mut document: Option<Document> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read name: {}", e)))?;
                if !value.trim().is_empty() {
                    name = Some(value);
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                document = Some(Document {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let document = document.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;

    let book = state
        .add_book_handler
        .handle(AddBook { name, document })
        .await?;

    Ok(Json(ApiResponse::success(book.into())))
}

/// 列出书库
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookDto>>>, ApiError> {
    let books = state.list_books_handler.handle(ListBooks).await?;
    Ok(Json(ApiResponse::success(
        books.into_iter().map(BookDto::from).collect(),
    )))
}

/// 获取书籍详情
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookIdRequest>,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    let book = state
        .get_book_handler
        .handle(GetBook { book_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(book.into())))
}

/// 删除书籍（正在阅读时先关闭会话）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookIdRequest>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    state
        .delete_book_handler
        .handle(DeleteBook { book_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(DeletedDto { id: req.id })))
}
