//! Book Context - 书库限界上下文
//!
//! 职责:
//! - 书籍聚合管理
//! - 上次阅读位置

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Book;
pub use errors::BookError;
pub use value_objects::{BookId, BookName};
