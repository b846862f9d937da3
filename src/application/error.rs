//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::playback::TransportError;
use crate::application::ports::{ExtractionError, RepositoryError};
use crate::domain::book::BookError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 文档无法提取
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<ExtractionError> for ApplicationError {
    fn from(err: ExtractionError) -> Self {
        Self::ExtractionError(err.to_string())
    }
}

impl From<BookError> for ApplicationError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(id) => Self::not_found("Book", *id.as_uuid()),
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl From<TransportError> for ApplicationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidIndex { .. } => Self::ValidationError(err.to_string()),
            TransportError::InvalidState(message) => Self::InvalidState(message),
            TransportError::SessionClosed => Self::InvalidState(err.to_string()),
        }
    }
}
