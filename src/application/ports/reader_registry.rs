//! Reader Registry Port - 阅读会话登记
//!
//! 记录当前打开的阅读会话，具体实现在 infrastructure/memory 层

use thiserror::Error;

use crate::application::playback::SessionHandle;
use crate::domain::book::BookId;

/// Reader Registry 错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),
}

/// Reader Registry Port
///
/// 会话句柄只存在内存中，进程退出即消失
pub trait ReaderRegistryPort: Send + Sync {
    /// 登记新会话
    fn register(&self, handle: SessionHandle) -> Result<String, RegistryError>;

    /// 获取会话
    fn get(&self, session_id: &str) -> Result<SessionHandle, RegistryError>;

    /// 移除会话并返回其句柄
    fn remove(&self, session_id: &str) -> Result<SessionHandle, RegistryError>;

    /// 查找打开某本书的会话
    fn find_by_book(&self, book_id: BookId) -> Option<SessionHandle>;

    /// 移除全部会话
    fn drain(&self) -> Vec<SessionHandle>;

    /// 检查会话是否有效
    fn is_valid(&self, session_id: &str) -> bool;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;

    /// 当前打开的会话
    fn active(&self) -> Option<SessionHandle> {
        self.list_all().into_iter().find_map(|id| self.get(&id).ok())
    }
}
