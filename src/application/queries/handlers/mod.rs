//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod book_handlers;
mod reader_handlers;

pub use book_handlers::*;
pub use reader_handlers::*;
