//! Book Commands - 书库相关命令

use uuid::Uuid;

use crate::application::ports::Document;

/// 上传书籍命令
#[derive(Debug, Clone)]
pub struct AddBook {
    /// 为空时使用文件名
    pub name: Option<String>,
    pub document: Document,
}

/// 删除书籍命令
#[derive(Debug, Clone)]
pub struct DeleteBook {
    pub book_id: Uuid,
}
