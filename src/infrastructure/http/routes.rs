//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/book/upload       POST  上传书籍（multipart: file, name）
//! - /api/book/list         GET   列出书库
//! - /api/book/get          POST  获取书籍详情
//! - /api/book/delete       POST  删除书籍
//! - /api/reader/open       POST  打开书籍（关闭旧会话）
//! - /api/reader/close      POST  关闭阅读会话
//! - /api/reader/play       POST  播放（可指定片段）
//! - /api/reader/pause      POST  暂停
//! - /api/reader/stop       POST  停止并释放全部音频
//! - /api/reader/next       POST  下一段
//! - /api/reader/seek       POST  跳转片段
//! - /api/reader/click      POST  点击片段（播放中忽略）
//! - /api/reader/voice      POST  切换音色
//! - /api/reader/rate       POST  调整语速
//! - /api/reader/state      GET   当前播放状态
//! - /api/reader/chunks     GET   片段列表
//! - /api/voice/list        GET   预置音色
//! - /ws/reader             WS    播放状态推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/reader", get(handlers::reader_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/book", book_routes())
        .nest("/reader", reader_routes())
        .route("/voice/list", get(handlers::list_voices))
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(handlers::upload_book))
        .route("/list", get(handlers::list_books))
        .route("/get", post(handlers::get_book))
        .route("/delete", post(handlers::delete_book))
}

/// Reader 路由
fn reader_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_reader))
        .route("/close", post(handlers::close_reader))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/stop", post(handlers::stop))
        .route("/next", post(handlers::next))
        .route("/seek", post(handlers::seek))
        .route("/click", post(handlers::click_chunk))
        .route("/voice", post(handlers::set_voice))
        .route("/rate", post(handlers::set_rate))
        .route("/state", get(handlers::reader_state))
        .route("/chunks", get(handlers::reader_chunks))
}
