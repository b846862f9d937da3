//! Reader Queries - 阅读会话查询

/// 当前会话的播放状态
#[derive(Debug, Clone, Default)]
pub struct GetReaderState;

/// 当前会话的片段列表
#[derive(Debug, Clone, Default)]
pub struct GetReaderChunks {
    pub start_index: Option<usize>,
    pub limit: Option<usize>,
}

/// 列出可用音色
#[derive(Debug, Clone)]
pub struct ListVoices;
