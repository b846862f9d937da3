//! 可播放音频资源
//!
//! `AudioResource` 是一个共享的不透明句柄，最后一个持有者丢弃时资源被释放，
//! 释放只会发生一次。`ResourceLedger` 统计一个会话内的创建/释放次数。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::wav::pcm16_to_wav;

/// 资源计数
#[derive(Debug, Default)]
pub struct ResourceLedger {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl ResourceLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// 尚未释放的资源数
    pub fn live(&self) -> usize {
        self.created().saturating_sub(self.released())
    }
}

struct ResourceInner {
    index: usize,
    wav: Vec<u8>,
    duration: Duration,
    ledger: Arc<ResourceLedger>,
}

impl Drop for ResourceInner {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(index = self.index, "Audio resource released");
    }
}

/// 一个片段的可播放音频（WAV 容器）
#[derive(Clone)]
pub struct AudioResource {
    inner: Arc<ResourceInner>,
}

impl AudioResource {
    /// 从 16-bit PCM 构建资源，没有完整样本时返回 None
    pub fn from_pcm(
        index: usize,
        pcm: &[u8],
        channels: u16,
        sample_rate: u32,
        ledger: &Arc<ResourceLedger>,
    ) -> Option<Self> {
        let block_align = channels as usize * 2;
        if block_align == 0 || sample_rate == 0 || pcm.len() < block_align {
            return None;
        }

        let frames = pcm.len() / block_align;
        let duration = Duration::from_secs_f64(frames as f64 / sample_rate as f64);
        let wav = pcm16_to_wav(pcm, channels, sample_rate);

        ledger.created.fetch_add(1, Ordering::SeqCst);
        Some(Self {
            inner: Arc::new(ResourceInner {
                index,
                wav,
                duration,
                ledger: Arc::clone(ledger),
            }),
        })
    }

    /// 所属片段索引
    pub fn index(&self) -> usize {
        self.inner.index
    }

    /// 完整 WAV 字节
    pub fn wav(&self) -> &[u8] {
        &self.inner.wav
    }

    /// 1.0x 语速下的时长
    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    /// 两个句柄是否指向同一份资源
    pub fn same_as(&self, other: &AudioResource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResource")
            .field("index", &self.inner.index)
            .field("bytes", &self.inner.wav.len())
            .field("duration", &self.inner.duration)
            .finish()
    }
}
