//! 会话级音频缓存
//!
//! 片段索引 → 可播放资源。覆盖或清空时，缓存持有的句柄随即被丢弃。

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::AudioResource;

/// 音频缓存
#[derive(Debug, Default)]
pub struct AudioCache {
    entries: DashMap<usize, AudioResource>,
}

impl AudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 纯查询，无副作用
    pub fn get(&self, index: usize) -> Option<AudioResource> {
        self.entries.get(&index).map(|entry| entry.value().clone())
    }

    /// 存入资源，旧资源先被丢弃
    pub fn put(&self, index: usize, resource: AudioResource) {
        if let Some(old) = self.entries.insert(index, resource) {
            tracing::trace!(index = old.index(), "Replaced cached audio");
        }
    }

    /// 仅在 token 未取消时存入
    ///
    /// 检查与写入在同一分片锁内完成，`clear()` 之前先取消 token 即可保证
    /// 迟到的结果不会落入已清空的缓存。
    pub fn put_unless_cancelled(
        &self,
        index: usize,
        resource: AudioResource,
        token: &CancellationToken,
    ) -> bool {
        match self.entries.entry(index) {
            _ if token.is_cancelled() => false,
            Entry::Occupied(mut entry) => {
                entry.insert(resource);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(resource);
                true
            }
        }
    }

    /// 释放全部资源，可重复调用
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn has(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
