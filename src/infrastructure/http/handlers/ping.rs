//! Ping Handler
//!
//! 健康检查，同时报告语音合成服务是否可用

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tts_ready: bool,
    pub reader_open: bool,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tts_ready: state.tts_engine.health_check().await,
        reader_open: state.registry.active().is_some(),
    })
}
