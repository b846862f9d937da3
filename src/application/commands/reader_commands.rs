//! Reader Commands - 阅读会话命令

use uuid::Uuid;

/// 打开书籍（关闭当前会话）
#[derive(Debug, Clone)]
pub struct OpenReader {
    pub book_id: Uuid,
}

/// 关闭会话，未指定时关闭当前会话
#[derive(Debug, Clone, Default)]
pub struct CloseReader {
    pub session_id: Option<String>,
}
