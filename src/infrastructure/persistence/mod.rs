//! Persistence Layer - 数据持久化
//!
//! Sled 存储实现（书库 + 阅读位置）

pub mod sled;

pub use self::sled::{SledLibraryConfig, SledLibraryStore};
