//! 预取调度
//!
//! 在播放头之前保持一个有界的预取窗口。每次播放头前进都会调用，
//! 已缓存或在途的索引跳过，所以重复调用不会产生重复请求。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::pending::{ClaimKind, PendingSet};
use super::{AudioCache, ChunkSynthesizer, PlaybackError};
use crate::domain::playback::VoiceId;
use crate::domain::TextChunk;

/// 预取调度器
pub struct PrefetchScheduler {
    synthesizer: Arc<ChunkSynthesizer>,
    cache: Arc<AudioCache>,
    pending: PendingSet,
    window: usize,
}

impl PrefetchScheduler {
    pub fn new(
        synthesizer: Arc<ChunkSynthesizer>,
        cache: Arc<AudioCache>,
        pending: PendingSet,
        window: usize,
    ) -> Self {
        Self {
            synthesizer,
            cache,
            pending,
            window,
        }
    }

    /// 为 playhead+1 ..= playhead+window 发起后台合成
    ///
    /// 窗口之外仍在进行的预取先被取消，不再占用名额。
    /// 返回本次新发起的请求数。在途预取数达到窗口大小时不再发起。
    pub fn ensure_window(
        &self,
        playhead: usize,
        chunks: &Arc<[TextChunk]>,
        voice: &VoiceId,
        token: &CancellationToken,
    ) -> usize {
        let cancelled = self.pending.retain_window(playhead, self.window);
        if cancelled > 0 {
            tracing::debug!(playhead, cancelled, "Cancelled prefetches outside window");
        }

        let mut started = 0;

        for offset in 1..=self.window {
            let index = playhead + offset;
            let Some(chunk) = chunks.get(index) else {
                break;
            };

            if self.cache.has(index) || self.pending.contains(index) {
                continue;
            }

            if self.pending.count(ClaimKind::Prefetch) >= self.window {
                tracing::debug!(playhead, index, "Prefetch window full");
                break;
            }

            let Some(mut guard) = self.pending.try_claim(index, ClaimKind::Prefetch, token) else {
                continue;
            };

            let synthesizer = Arc::clone(&self.synthesizer);
            let cache = Arc::clone(&self.cache);
            let chunk = chunk.clone();
            let voice = voice.clone();

            tokio::spawn(async move {
                let token = guard.token().clone();
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = guard.wait_predecessors() => {}
                }
                match synthesizer.synthesize(&chunk, &voice, &token).await {
                    Ok(resource) => {
                        if cache.put_unless_cancelled(chunk.index, resource, &token) {
                            tracing::debug!(index = chunk.index, "Chunk prefetched");
                        }
                    }
                    Err(PlaybackError::Cancelled) => {}
                    Err(e) => {
                        // 轮到该片段播放时由前台请求重新合成
                        tracing::warn!(index = chunk.index, error = %e, "Prefetch failed");
                    }
                }
            });

            started += 1;
        }

        started
    }
}
