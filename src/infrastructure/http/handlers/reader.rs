//! Reader HTTP Handlers - 阅读会话与播放控制
//!
//! 播放控制作用于当前打开的会话

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    ApplicationError, CloseReader, GetReaderChunks, GetReaderState, OpenReader, SessionHandle,
};
use crate::domain::playback::{PlaybackRate, PlaybackSnapshot, VoiceId};
use crate::infrastructure::http::dto::{
    ApiResponse, ChunkDto, ChunksDto, ChunksQuery, CloseReaderRequest, ClosedDto, IndexRequest,
    OpenReaderDto, OpenReaderRequest, PlayRequest, RateRequest, ReaderStateDto, VoiceRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type SnapshotResponse = Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError>;

fn active_session(state: &AppState) -> Result<SessionHandle, ApiError> {
    state
        .registry
        .active()
        .ok_or_else(|| ApplicationError::invalid_state("no book is open in the reader").into())
}

// ============================================================================
// Session
// ============================================================================

pub async fn open_reader(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenReaderRequest>,
) -> Result<Json<ApiResponse<OpenReaderDto>>, ApiError> {
    let response = state
        .open_reader_handler
        .handle(OpenReader {
            book_id: req.book_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

pub async fn close_reader(
    State(state): State<Arc<AppState>>,
    req: Option<Json<CloseReaderRequest>>,
) -> Result<Json<ApiResponse<ClosedDto>>, ApiError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let closed = state
        .close_reader_handler
        .handle(CloseReader {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(ClosedDto { closed })))
}

// ============================================================================
// Transport
// ============================================================================

pub async fn play(State(state): State<Arc<AppState>>, req: Option<Json<PlayRequest>>) -> SnapshotResponse {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let snapshot = active_session(&state)?.play(req.index).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn pause(State(state): State<Arc<AppState>>) -> SnapshotResponse {
    let snapshot = active_session(&state)?.pause().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn stop(State(state): State<Arc<AppState>>) -> SnapshotResponse {
    let snapshot = active_session(&state)?.stop().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn next(State(state): State<Arc<AppState>>) -> SnapshotResponse {
    let snapshot = active_session(&state)?.next().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexRequest>,
) -> SnapshotResponse {
    let snapshot = active_session(&state)?.seek(req.index).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn click_chunk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexRequest>,
) -> SnapshotResponse {
    let snapshot = active_session(&state)?.click_chunk(req.index).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn set_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VoiceRequest>,
) -> SnapshotResponse {
    let voice = VoiceId::from_catalogue(&req.voice)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown voice: {}", req.voice)))?;
    let snapshot = active_session(&state)?.set_voice(voice).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RateRequest>,
) -> SnapshotResponse {
    let rate = PlaybackRate::new(req.rate).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let snapshot = active_session(&state)?.set_rate(rate).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

// ============================================================================
// Queries
// ============================================================================

pub async fn reader_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ReaderStateDto>>, ApiError> {
    let response = state.get_reader_state_handler.handle(GetReaderState)?;
    Ok(Json(ApiResponse::success(response.into())))
}

pub async fn reader_chunks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChunksQuery>,
) -> Result<Json<ApiResponse<ChunksDto>>, ApiError> {
    let total = state
        .get_reader_state_handler
        .handle(GetReaderState)?
        .snapshot
        .chunk_count;
    let chunks = state.get_reader_chunks_handler.handle(GetReaderChunks {
        start_index: query.start,
        limit: query.limit,
    })?;

    Ok(Json(ApiResponse::success(ChunksDto {
        total,
        chunks: chunks.into_iter().map(ChunkDto::from).collect(),
    })))
}
