//! 片段合成
//!
//! 把片段文本交给外部合成服务，结果转成可播放资源。
//! 前台获取先查缓存，再等待同索引的在途请求，最后才自己发起合成。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::pending::{wait_settled, ClaimKind, PendingSet};
use super::{AudioCache, AudioResource, PlaybackError, ResourceLedger};
use crate::application::ports::{SynthesisError, SynthesisRequest, TtsEnginePort};
use crate::domain::playback::VoiceId;
use crate::domain::TextChunk;

/// 片段合成器（每个会话一个，资源计数随之隔离）
pub struct ChunkSynthesizer {
    tts: Arc<dyn TtsEnginePort>,
    ledger: Arc<ResourceLedger>,
}

impl ChunkSynthesizer {
    pub fn new(tts: Arc<dyn TtsEnginePort>) -> Self {
        Self {
            tts,
            ledger: ResourceLedger::new(),
        }
    }

    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.ledger
    }

    /// 合成单个片段
    ///
    /// 空白文本在本地拒绝，不会请求外部服务
    pub async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceId,
        token: &CancellationToken,
    ) -> Result<AudioResource, PlaybackError> {
        if chunk.text.trim().is_empty() {
            return Err(SynthesisError::EmptyText.into());
        }
        if token.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }

        let request = SynthesisRequest {
            text: chunk.text.clone(),
            voice: voice.clone(),
        };

        let speech = tokio::select! {
            _ = token.cancelled() => return Err(PlaybackError::Cancelled),
            result = self.tts.synthesize(request) => result?,
        };

        if token.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }

        AudioResource::from_pcm(
            chunk.index,
            &speech.pcm,
            speech.channels,
            speech.sample_rate,
            &self.ledger,
        )
        .ok_or_else(|| {
            SynthesisError::InvalidResponse(format!("no audio samples for chunk {}", chunk.index))
                .into()
        })
    }

    /// 获取当前片段的音频
    ///
    /// 合成成功的结果会写入缓存（token 已取消时除外）
    pub async fn obtain(
        &self,
        chunk: &TextChunk,
        voice: &VoiceId,
        cache: &AudioCache,
        pending: &PendingSet,
        token: &CancellationToken,
    ) -> Result<AudioResource, PlaybackError> {
        loop {
            if token.is_cancelled() {
                return Err(PlaybackError::Cancelled);
            }

            if let Some(resource) = cache.get(chunk.index) {
                return Ok(resource);
            }

            match pending.try_claim(chunk.index, ClaimKind::Foreground, token) {
                Some(mut guard) => {
                    let claim_token = guard.token().clone();
                    tokio::select! {
                        _ = claim_token.cancelled() => return Err(PlaybackError::Cancelled),
                        _ = guard.wait_predecessors() => {}
                    }
                    let resource = self.synthesize(chunk, voice, &claim_token).await?;
                    cache.put_unless_cancelled(chunk.index, resource.clone(), &claim_token);
                    return Ok(resource);
                }
                None => {
                    let Some(done) = pending.watch(chunk.index) else {
                        continue;
                    };
                    tracing::debug!(index = chunk.index, "Waiting for in-flight synthesis");
                    tokio::select! {
                        _ = token.cancelled() => return Err(PlaybackError::Cancelled),
                        _ = wait_settled(done) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{chunks, settle, ScriptedTts};

    #[tokio::test]
    async fn test_blank_text_rejected_locally() {
        let tts = Arc::new(ScriptedTts::new());
        let synthesizer = ChunkSynthesizer::new(tts.clone());
        let blank = TextChunk {
            index: 0,
            text: "   ".to_string(),
        };

        let result = synthesizer
            .synthesize(&blank, &VoiceId::default(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(PlaybackError::Synthesis(SynthesisError::EmptyText))
        ));
        assert_eq!(tts.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_audio_is_invalid_response() {
        let tts = Arc::new(ScriptedTts::new().with_silence());
        let synthesizer = ChunkSynthesizer::new(tts);
        let chunk = &chunks(1)[0];

        let result = synthesizer
            .synthesize(chunk, &VoiceId::default(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(PlaybackError::Synthesis(SynthesisError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_obtain_hits_cache_first() {
        let tts = Arc::new(ScriptedTts::new());
        let synthesizer = ChunkSynthesizer::new(tts.clone());
        let cache = AudioCache::new();
        let pending = PendingSet::new();
        let token = CancellationToken::new();
        let chunk = &chunks(1)[0];

        let first = synthesizer
            .obtain(chunk, &VoiceId::default(), &cache, &pending, &token)
            .await
            .unwrap();
        let second = synthesizer
            .obtain(chunk, &VoiceId::default(), &cache, &pending, &token)
            .await
            .unwrap();

        assert!(first.same_as(&second));
        assert_eq!(tts.calls_for(0), 1);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_obtain_waits_for_in_flight_claim() {
        let tts = Arc::new(ScriptedTts::new());
        let synthesizer = Arc::new(ChunkSynthesizer::new(tts.clone()));
        let cache = Arc::new(AudioCache::new());
        let pending = PendingSet::new();
        let token = CancellationToken::new();
        let chunk = chunks(1).remove(0);

        let guard = pending.try_claim(0, ClaimKind::Prefetch, &token).unwrap();

        let waiter = {
            let synthesizer = Arc::clone(&synthesizer);
            let cache = Arc::clone(&cache);
            let pending = pending.clone();
            let token = token.clone();
            let chunk = chunk.clone();
            tokio::spawn(async move {
                synthesizer
                    .obtain(&chunk, &VoiceId::default(), &cache, &pending, &token)
                    .await
            })
        };

        tokio::task::yield_now().await;
        assert_eq!(tts.calls_for(0), 0);

        // 模拟预取完成
        let resource = synthesizer
            .synthesize(&chunk, &VoiceId::default(), &token)
            .await
            .unwrap();
        cache.put(0, resource);
        drop(guard);

        let obtained = waiter.await.unwrap().unwrap();
        assert_eq!(obtained.index(), 0);
        assert_eq!(tts.calls_for(0), 1);
    }

    #[tokio::test]
    async fn test_obtain_waits_for_cancelled_request_to_finish() {
        let tts = Arc::new(ScriptedTts::new());
        let synthesizer = Arc::new(ChunkSynthesizer::new(tts.clone()));
        let cache = Arc::new(AudioCache::new());
        let pending = PendingSet::new();
        let token = CancellationToken::new();
        let chunk = chunks(1).remove(0);

        let stale = pending.try_claim(0, ClaimKind::Foreground, &token).unwrap();
        pending.cancel_all();

        let waiter = {
            let synthesizer = Arc::clone(&synthesizer);
            let cache = Arc::clone(&cache);
            let pending = pending.clone();
            let token = token.clone();
            tokio::spawn(async move {
                synthesizer
                    .obtain(&chunk, &VoiceId::default(), &cache, &pending, &token)
                    .await
            })
        };

        settle().await;
        assert_eq!(tts.calls_for(0), 0);
        assert!(!waiter.is_finished());

        // 旧请求结束后才发起新请求
        drop(stale);
        let obtained = waiter.await.unwrap().unwrap();
        assert_eq!(obtained.index(), 0);
        assert_eq!(tts.calls_for(0), 1);
        assert!(cache.has(0));
    }

    #[tokio::test]
    async fn test_obtain_after_cancel() {
        let tts = Arc::new(ScriptedTts::new());
        let synthesizer = ChunkSynthesizer::new(tts.clone());
        let cache = AudioCache::new();
        let pending = PendingSet::new();
        let token = CancellationToken::new();
        token.cancel();

        let result = synthesizer
            .obtain(&chunks(1)[0], &VoiceId::default(), &cache, &pending, &token)
            .await;

        assert!(matches!(result, Err(PlaybackError::Cancelled)));
        assert_eq!(tts.total_calls(), 0);
        assert!(cache.is_empty());
    }
}
