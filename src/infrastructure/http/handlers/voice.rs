//! Voice Handlers - 预置音色

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ListVoices;
use crate::domain::playback::VoiceInfo;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// 列出预置音色，第一个为默认音色
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<VoiceInfo>>> {
    Json(ApiResponse::success(state.list_voices_handler.handle(ListVoices)))
}
