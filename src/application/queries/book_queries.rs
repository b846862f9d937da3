//! Book Queries - 书库查询

use uuid::Uuid;

/// 获取书籍详情查询
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: Uuid,
}

/// 列出所有书籍查询
#[derive(Debug, Clone)]
pub struct ListBooks;
