//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{BookResponse, OpenReaderResponse, ReaderStateResponse};
use crate::domain::playback::PlaybackSnapshot;
use crate::domain::TextChunk;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BookIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BookDto {
    pub id: Uuid,
    pub name: String,
    pub thumbnail: Option<String>,
    pub chunk_count: usize,
    pub last_position: usize,
    pub created_at: String,
}

impl From<BookResponse> for BookDto {
    fn from(book: BookResponse) -> Self {
        Self {
            id: book.id,
            name: book.name,
            thumbnail: book.thumbnail,
            chunk_count: book.chunk_count,
            last_position: book.last_position,
            created_at: book.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub id: Uuid,
}

// ============================================================================
// Reader DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenReaderRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseReaderRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    /// 为空时从当前片段开始
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub voice: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rate: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunksQuery {
    pub start: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OpenReaderDto {
    pub session_id: String,
    pub name: String,
    pub state: PlaybackSnapshot,
}

impl From<OpenReaderResponse> for OpenReaderDto {
    fn from(response: OpenReaderResponse) -> Self {
        Self {
            session_id: response.session.id().to_string(),
            name: response.name,
            state: response.session.snapshot(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClosedDto {
    pub closed: usize,
}

#[derive(Debug, Serialize)]
pub struct ReaderStateDto {
    pub session_id: String,
    #[serde(flatten)]
    pub state: PlaybackSnapshot,
}

impl From<ReaderStateResponse> for ReaderStateDto {
    fn from(response: ReaderStateResponse) -> Self {
        Self {
            session_id: response.session_id,
            state: response.snapshot,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChunkDto {
    pub index: usize,
    pub text: String,
}

impl From<TextChunk> for ChunkDto {
    fn from(chunk: TextChunk) -> Self {
        Self {
            index: chunk.index,
            text: chunk.text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChunksDto {
    pub total: usize,
    pub chunks: Vec<ChunkDto>,
}
