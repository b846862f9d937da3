//! Playback Controller - 朗读播放状态机
//!
//! 控制器是播放状态唯一的修改者。用户命令通过 `apply` 进入，
//! 合成完成和音频自然结束作为 `PlaybackEvent` 回到同一个所有者，
//! 由 `handle_event` 处理。
//!
//! 每次进入新片段或停止都会推进 generation，携带旧 generation 的事件被丢弃；
//! 停止会取消当前运行 token，迟到的合成结果因此不会写入缓存或挂载播放。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::pending::PendingSet;
use super::{
    AudioCache, AudioResource, ChunkSynthesizer, PlaybackError, PrefetchScheduler,
    ResourceLedger, TransportError,
};
use crate::application::ports::{
    ActivePlayback, AudioOutputError, AudioOutputPort, PlaybackControl, PlaybackOutcome,
    PositionStorePort, TtsEnginePort,
};
use crate::domain::book::BookId;
use crate::domain::playback::{
    PlaybackRate, PlaybackSnapshot, PlaybackState, PlaybackStatus, VoiceId,
};
use crate::domain::TextChunk;

/// 默认预取窗口
pub const DEFAULT_PREFETCH_WINDOW: usize = 3;

/// 控制器配置
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub prefetch_window: usize,
    pub voice: VoiceId,
    pub rate: PlaybackRate,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            prefetch_window: DEFAULT_PREFETCH_WINDOW,
            voice: VoiceId::default(),
            rate: PlaybackRate::default(),
        }
    }
}

/// 控制器依赖的外部协作者
#[derive(Clone)]
pub struct PlaybackDeps {
    pub tts: Arc<dyn TtsEnginePort>,
    pub output: Arc<dyn AudioOutputPort>,
    pub positions: Arc<dyn PositionStorePort>,
}

/// 用户传输控制
#[derive(Debug, Clone, PartialEq)]
pub enum Transport {
    Play(Option<usize>),
    Pause,
    Stop,
    Next,
    Seek(usize),
    Click(usize),
    SetVoice(VoiceId),
    SetRate(PlaybackRate),
}

/// 异步操作完成后回到控制器的事件
#[derive(Debug)]
pub enum PlaybackEvent {
    /// 当前片段的音频已获取（或失败）
    AudioReady {
        generation: u64,
        index: usize,
        result: Result<AudioResource, PlaybackError>,
    },
    /// 已挂载的音频播放结束
    PlaybackFinished {
        generation: u64,
        outcome: PlaybackOutcome,
    },
}

struct Attached {
    index: usize,
    // 播放期间保持资源存活
    _resource: AudioResource,
    control: Box<dyn PlaybackControl>,
}

/// 播放控制器
pub struct PlaybackController {
    book_id: BookId,
    chunks: Arc<[TextChunk]>,
    state: PlaybackState,
    message: String,

    cache: Arc<AudioCache>,
    pending: PendingSet,
    synthesizer: Arc<ChunkSynthesizer>,
    scheduler: PrefetchScheduler,
    output: Arc<dyn AudioOutputPort>,
    positions: mpsc::UnboundedSender<usize>,

    session_token: CancellationToken,
    run_token: CancellationToken,
    generation: u64,
    attached: Option<Attached>,

    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    events_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackController {
    /// 创建控制器，起始位置超出范围时从 0 开始
    pub fn new(
        book_id: BookId,
        chunks: Vec<TextChunk>,
        start_index: usize,
        config: ControllerConfig,
        deps: PlaybackDeps,
    ) -> Self {
        let chunks: Arc<[TextChunk]> = chunks.into();
        let start_index = if start_index < chunks.len() { start_index } else { 0 };

        let cache = Arc::new(AudioCache::new());
        let pending = PendingSet::new();
        let synthesizer = Arc::new(ChunkSynthesizer::new(deps.tts));
        let scheduler = PrefetchScheduler::new(
            Arc::clone(&synthesizer),
            Arc::clone(&cache),
            pending.clone(),
            config.prefetch_window,
        );

        let session_token = CancellationToken::new();
        let run_token = session_token.child_token();
        let positions = spawn_position_writer(book_id, deps.positions);

        let state = PlaybackState::new(start_index, config.rate, config.voice);
        let message = "Ready to play.".to_string();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(PlaybackSnapshot {
            book_id,
            status: state.status,
            current_index: state.current_index,
            chunk_count: chunks.len(),
            rate: state.rate.value(),
            voice: state.voice.to_string(),
            message: message.clone(),
        });

        Self {
            book_id,
            chunks,
            state,
            message,
            cache,
            pending,
            synthesizer,
            scheduler,
            output: deps.output,
            positions,
            session_token,
            run_token,
            generation: 0,
            attached: None,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    // ========================================================================
    // 观察
    // ========================================================================

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn chunks(&self) -> &Arc<[TextChunk]> {
        &self.chunks
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        self.synthesizer.ledger()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            book_id: self.book_id,
            status: self.state.status,
            current_index: self.state.current_index,
            chunk_count: self.chunks.len(),
            rate: self.state.rate.value(),
            voice: self.state.voice.to_string(),
            message: self.message.clone(),
        }
    }

    /// 订阅状态快照
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ========================================================================
    // 传输控制
    // ========================================================================

    pub async fn apply(&mut self, command: Transport) -> Result<(), TransportError> {
        match command {
            Transport::Play(index) => self.play(index).await,
            Transport::Pause => {
                self.pause();
                Ok(())
            }
            Transport::Stop => {
                self.stop();
                Ok(())
            }
            Transport::Next => self.next().await,
            Transport::Seek(index) => self.seek(index).await,
            Transport::Click(index) => self.click_chunk(index).await,
            Transport::SetVoice(voice) => self.set_voice(voice),
            Transport::SetRate(rate) => {
                self.set_rate(rate);
                Ok(())
            }
        }
    }

    /// 播放；带索引时等同 seek
    pub async fn play(&mut self, index: Option<usize>) -> Result<(), TransportError> {
        if let Some(index) = index {
            return self.seek(index).await;
        }

        match self.state.status {
            PlaybackStatus::Playing => Ok(()),
            PlaybackStatus::Paused if self.attached.is_some() => {
                self.resume();
                Ok(())
            }
            _ => {
                if self.chunks.is_empty() {
                    return Err(TransportError::InvalidState(
                        "book has no readable chunks".to_string(),
                    ));
                }
                let index = if self.state.current_index < self.chunks.len() {
                    self.state.current_index
                } else {
                    0
                };
                self.begin(index).await;
                Ok(())
            }
        }
    }

    /// 暂停，保留当前资源
    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            return;
        }

        match self.attached.as_mut() {
            Some(attached) => attached.control.pause(),
            // 音频还在获取中，到达后不挂载，恢复时走缓存
            None => self.generation += 1,
        }

        self.state.status = PlaybackStatus::Paused;
        self.message = "Paused.".to_string();
        self.publish();
        tracing::debug!(book_id = %self.book_id, index = self.state.current_index, "Playback paused");
    }

    /// 停止：释放当前资源，清空缓存和在途集合。任意状态下可调用。
    pub fn stop(&mut self) {
        self.halt_all();
        self.state.status = PlaybackStatus::Stopped;
        self.message = "Stopped.".to_string();
        self.publish();
        tracing::debug!(book_id = %self.book_id, index = self.state.current_index, "Playback stopped");
    }

    /// 下一个片段，位于最后一个片段时无效
    pub async fn next(&mut self) -> Result<(), TransportError> {
        let next = self.state.current_index + 1;
        if next >= self.chunks.len() {
            tracing::debug!(index = self.state.current_index, "Already at last chunk");
            return Ok(());
        }
        self.begin(next).await;
        Ok(())
    }

    /// 跳转并播放，缓存保留
    pub async fn seek(&mut self, index: usize) -> Result<(), TransportError> {
        self.check_index(index)?;
        self.begin(index).await;
        Ok(())
    }

    /// 点击片段：播放中忽略，否则跳转播放
    pub async fn click_chunk(&mut self, index: usize) -> Result<(), TransportError> {
        self.check_index(index)?;
        if self.state.is_playing() {
            tracing::debug!(index, "Chunk click ignored while playing");
            return Ok(());
        }
        self.begin(index).await;
        Ok(())
    }

    /// 更换音色，播放中不允许
    ///
    /// 已缓存的音频属于旧音色，一并丢弃
    pub fn set_voice(&mut self, voice: VoiceId) -> Result<(), TransportError> {
        if self.state.is_playing() {
            return Err(TransportError::InvalidState(
                "cannot change voice while playing".to_string(),
            ));
        }
        if voice == self.state.voice {
            return Ok(());
        }

        self.halt_all();
        if self.state.status == PlaybackStatus::Paused {
            self.state.status = PlaybackStatus::Stopped;
            self.message = "Stopped.".to_string();
        }
        tracing::info!(book_id = %self.book_id, voice = %voice, "Voice changed");
        self.state.voice = voice;
        self.publish();
        Ok(())
    }

    /// 更换语速，立即作用于当前音频
    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.state.rate = rate;
        if let Some(attached) = self.attached.as_mut() {
            attached.control.set_rate(rate);
        }
        self.publish();
    }

    /// 会话结束：停止并释放全部资源
    pub fn teardown(&mut self) {
        self.halt_all();
        self.session_token.cancel();
        self.state.status = PlaybackStatus::Idle;
        self.message = "Closed.".to_string();
        self.publish();
        tracing::info!(book_id = %self.book_id, "Reader session torn down");
    }

    // ========================================================================
    // 事件
    // ========================================================================

    /// 等待下一个内部事件
    pub async fn next_event(&mut self) -> Option<PlaybackEvent> {
        self.events_rx.recv().await
    }

    /// 处理下一个内部事件
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event).await;
                true
            }
            None => false,
        }
    }

    pub async fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::AudioReady {
                generation,
                index,
                result,
            } => {
                if generation != self.generation
                    || !self.state.is_playing()
                    || self.run_token.is_cancelled()
                {
                    tracing::trace!(index, generation, "Discarding stale audio");
                    return;
                }
                match result {
                    Ok(resource) => self.attach(resource).await,
                    Err(PlaybackError::Cancelled) => {}
                    Err(e) => self.fail(e),
                }
            }
            PlaybackEvent::PlaybackFinished {
                generation,
                outcome,
            } => {
                if generation != self.generation || self.attached.is_none() {
                    return;
                }
                match outcome {
                    PlaybackOutcome::Finished => self.advance().await,
                    PlaybackOutcome::Failed(reason) => {
                        self.fail(AudioOutputError::PlaybackFailed(reason).into())
                    }
                }
            }
        }
    }

    // ========================================================================
    // 内部转换
    // ========================================================================

    /// 进入 Playing：保存位置，预取窗口，获取当前片段音频
    async fn begin(&mut self, index: usize) {
        let Some(chunk) = self.chunks.get(index).cloned() else {
            return;
        };

        self.release_attached();
        self.generation += 1;
        self.state.status = PlaybackStatus::Playing;
        self.state.current_index = index;
        self.message = self.reading_message();
        self.publish();

        let _ = self.positions.send(index);

        self.scheduler
            .ensure_window(index, &self.chunks, &self.state.voice, &self.run_token);

        if let Some(resource) = self.cache.get(index) {
            self.attach(resource).await;
            return;
        }

        let generation = self.generation;
        let synthesizer = Arc::clone(&self.synthesizer);
        let cache = Arc::clone(&self.cache);
        let pending = self.pending.clone();
        let voice = self.state.voice.clone();
        let token = self.run_token.clone();
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = synthesizer
                .obtain(&chunk, &voice, &cache, &pending, &token)
                .await;
            let _ = events.send(PlaybackEvent::AudioReady {
                generation,
                index,
                result,
            });
        });
    }

    fn resume(&mut self) {
        let Some(attached) = self.attached.as_mut() else {
            return;
        };
        match attached.control.resume() {
            Ok(()) => {
                self.state.status = PlaybackStatus::Playing;
                self.message = self.reading_message();
                self.publish();
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// 挂载音频，先释放上一个资源
    async fn attach(&mut self, resource: AudioResource) {
        self.release_attached();
        let index = resource.index();

        let active = match self.output.start(resource.clone(), self.state.rate).await {
            Ok(active) => active,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };
        let ActivePlayback {
            mut control,
            finished,
        } = active;

        if self.run_token.is_cancelled() {
            control.halt();
            return;
        }

        let generation = self.generation;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            // halt 后 sender 被丢弃，不发事件
            if let Ok(outcome) = finished.await {
                let _ = events.send(PlaybackEvent::PlaybackFinished {
                    generation,
                    outcome,
                });
            }
        });

        self.attached = Some(Attached {
            index,
            _resource: resource,
            control,
        });
        tracing::debug!(book_id = %self.book_id, index, rate = %self.state.rate, "Chunk playback started");
    }

    /// 自然播放结束：播放头 +1，读完后回到 0 并停止
    async fn advance(&mut self) {
        self.release_attached();
        let next = self.state.current_index + 1;

        if next >= self.chunks.len() {
            self.halt_all();
            self.state.status = PlaybackStatus::Stopped;
            self.state.current_index = 0;
            self.message = "Finished reading.".to_string();
            let _ = self.positions.send(0);
            self.publish();
            tracing::info!(book_id = %self.book_id, "Reached end of book");
            return;
        }

        if self.state.is_playing() {
            self.begin(next).await;
        } else {
            self.state.current_index = next;
            self.publish();
        }
    }

    /// 当前播放尝试失败：停止并显示错误信息
    fn fail(&mut self, error: PlaybackError) {
        tracing::warn!(
            book_id = %self.book_id,
            index = self.state.current_index,
            error = %error,
            "Playback halted"
        );
        self.halt_all();
        self.state.status = PlaybackStatus::Stopped;
        self.message = error.status_message().to_string();
        self.publish();
    }

    /// 取消在途工作并释放全部资源
    fn halt_all(&mut self) {
        self.run_token.cancel();
        self.run_token = self.session_token.child_token();
        self.generation += 1;
        self.release_attached();
        self.cache.clear();
        self.pending.cancel_all();
    }

    fn release_attached(&mut self) {
        if let Some(mut attached) = self.attached.take() {
            attached.control.halt();
            tracing::trace!(index = attached.index, "Audio detached");
        }
    }

    fn check_index(&self, index: usize) -> Result<(), TransportError> {
        if index >= self.chunks.len() {
            return Err(TransportError::InvalidIndex {
                index,
                chunk_count: self.chunks.len(),
            });
        }
        Ok(())
    }

    fn reading_message(&self) -> String {
        format!(
            "Reading chunk {} of {}...",
            self.state.current_index + 1,
            self.chunks.len()
        )
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.session_token.cancel();
    }
}

/// 位置按顺序写入，失败只记日志
fn spawn_position_writer(
    book_id: BookId,
    store: Arc<dyn PositionStorePort>,
) -> mpsc::UnboundedSender<usize> {
    let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
    tokio::spawn(async move {
        while let Some(index) = rx.recv().await {
            if let Err(e) = store.save_position(book_id, index).await {
                let e = PlaybackError::from(e);
                tracing::warn!(book_id = %book_id, index, error = %e, "Failed to save reading position");
            }
        }
    });
    tx
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::playback::pending::ClaimKind;
    use crate::application::testing::{
        chunks, settle, ManualOutput, MemoryPositions, ScriptedTts,
    };

    struct Harness {
        controller: PlaybackController,
        tts: Arc<ScriptedTts>,
        output: Arc<ManualOutput>,
        positions: Arc<MemoryPositions>,
    }

    fn harness_with(n: usize, window: usize, tts: ScriptedTts, positions: MemoryPositions) -> Harness {
        let tts = Arc::new(tts);
        let output = Arc::new(ManualOutput::new());
        let positions = Arc::new(positions);
        let deps = PlaybackDeps {
            tts: tts.clone(),
            output: output.clone(),
            positions: positions.clone(),
        };
        let config = ControllerConfig {
            prefetch_window: window,
            ..ControllerConfig::default()
        };
        let controller = PlaybackController::new(BookId::new(), chunks(n), 0, config, deps);
        Harness {
            controller,
            tts,
            output,
            positions,
        }
    }

    fn harness(n: usize, window: usize) -> Harness {
        harness_with(n, window, ScriptedTts::new(), MemoryPositions::new())
    }

    async fn step(controller: &mut PlaybackController) {
        tokio::time::timeout(Duration::from_secs(2), controller.step())
            .await
            .expect("no playback event arrived");
    }

    /// 处理事件直到当前片段挂载
    async fn until_attached(h: &mut Harness, index: usize) {
        for _ in 0..10 {
            if h.output.current_index() == Some(index) {
                return;
            }
            step(&mut h.controller).await;
        }
        panic!("chunk {} never attached", index);
    }

    #[tokio::test]
    async fn test_play_synthesizes_and_attaches_current_chunk() {
        let mut h = harness(5, 3);

        h.controller.play(None).await.unwrap();
        assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
        assert_eq!(h.controller.message(), "Reading chunk 1 of 5...");

        until_attached(&mut h, 0).await;
        assert_eq!(h.tts.calls_for(0), 1);
        assert!(h.controller.cache().has(0));
    }

    #[tokio::test]
    async fn test_prefetch_ready_before_next_chunk() {
        let mut h = harness(5, 3);

        h.controller.play(Some(0)).await.unwrap();
        until_attached(&mut h, 0).await;
        settle().await;

        h.output.finish_current();
        step(&mut h.controller).await;

        assert_eq!(h.controller.state().current_index, 1);
        assert_eq!(h.output.current_index(), Some(1));
        for index in 1..=3 {
            assert!(h.controller.cache().has(index), "chunk {} not prefetched", index);
            assert_eq!(h.tts.calls_for(index), 1);
        }
    }

    #[tokio::test]
    async fn test_pause_then_play_resumes_same_chunk() {
        let mut h = harness(5, 3);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        h.controller.pause();
        assert_eq!(h.controller.state().status, PlaybackStatus::Paused);
        assert_eq!(h.controller.message(), "Paused.");
        assert_eq!(h.output.current_paused(), Some(true));

        h.controller.play(None).await.unwrap();
        assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
        assert_eq!(h.controller.state().current_index, 0);
        assert_eq!(h.output.current_paused(), Some(false));
        assert_eq!(h.output.start_count(), 1);
        assert_eq!(h.tts.calls_for(0), 1);
    }

    #[tokio::test]
    async fn test_last_chunk_completion_resets_to_start() {
        let mut h = harness(5, 3);

        h.controller.play(Some(4)).await.unwrap();
        until_attached(&mut h, 4).await;

        h.output.finish_current();
        step(&mut h.controller).await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert_eq!(h.controller.state().current_index, 0);
        assert!(h.controller.cache().is_empty());
        settle().await;
        assert_eq!(h.controller.ledger().live(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_on_current_chunk_stops() {
        let mut h = harness_with(5, 3, ScriptedTts::new().failing_on(2), MemoryPositions::new());

        h.controller.play(Some(2)).await.unwrap();
        step(&mut h.controller).await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert_eq!(h.controller.message(), "Error generating audio.");
        assert!(!h.controller.cache().has(2));
        assert_eq!(h.output.start_count(), 0);
    }

    #[tokio::test]
    async fn test_prefetch_failure_is_retried_when_current() {
        let mut h = harness_with(5, 3, ScriptedTts::new().failing_on(1), MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        settle().await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
        assert!(!h.controller.cache().has(1));
        assert!(h.controller.cache().has(2));

        h.output.finish_current();
        step(&mut h.controller).await;
        step(&mut h.controller).await;

        assert_eq!(h.tts.calls_for(1), 2);
        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_clears_cache_and_releases_everything() {
        let mut h = harness(6, 3);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        settle().await;
        assert!(h.controller.ledger().created() >= 4);

        h.controller.stop();
        settle().await;

        for index in 0..6 {
            assert!(h.controller.cache().get(index).is_none());
        }
        assert!(h.controller.pending().is_empty());
        assert_eq!(h.controller.ledger().live(), 0);
        assert_eq!(h.output.current_index(), None);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut h = harness(4, 2);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        h.controller.stop();
        let once = h.controller.snapshot();
        h.controller.stop();
        let twice = h.controller.snapshot();

        assert_eq!(once, twice);
        assert_eq!(twice.status, PlaybackStatus::Stopped);
        assert_eq!(twice.message, "Stopped.");
    }

    #[tokio::test]
    async fn test_stop_from_idle_is_safe() {
        let mut h = harness(3, 2);
        h.controller.stop();
        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert!(h.controller.cache().is_empty());
    }

    #[tokio::test]
    async fn test_late_synthesis_after_stop_is_discarded() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(30));
        let mut h = harness_with(4, 2, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        h.controller.stop();

        tokio::time::sleep(Duration::from_millis(60)).await;
        // 取消的获取仍会回送事件，但 generation 已过期
        let _ = tokio::time::timeout(Duration::from_millis(50), h.controller.step()).await;
        settle().await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert_eq!(h.output.start_count(), 0);
        assert!(h.controller.cache().is_empty());
        assert_eq!(h.controller.ledger().live(), 0);
    }

    #[tokio::test]
    async fn test_natural_completion_advances_by_one() {
        let mut h = harness(5, 2);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        for expected in 1..4 {
            h.output.finish_current();
            until_attached(&mut h, expected).await;
            assert_eq!(h.controller.state().current_index, expected);
            assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
        }
    }

    #[tokio::test]
    async fn test_window_bounds_in_flight_requests() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(20));
        let mut h = harness_with(12, 2, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        assert_eq!(h.controller.pending().count(ClaimKind::Prefetch), 2);
        until_attached(&mut h, 0).await;
        settle().await;

        // 两个预取 + 一个前台
        assert!(h.tts.max_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_seek_refills_window_while_prefetches_in_flight() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(40));
        let mut h = harness_with(12, 3, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        assert_eq!(h.controller.pending().count(ClaimKind::Prefetch), 3);
        h.controller.seek(6).await.unwrap();
        assert_eq!(h.controller.pending().count(ClaimKind::Prefetch), 3);

        until_attached(&mut h, 6).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;

        for index in 7..=9 {
            assert!(h.controller.cache().has(index), "chunk {} not prefetched", index);
            assert_eq!(h.tts.calls_for(index), 1);
        }
        assert!(!h.controller.cache().has(2));
        assert_eq!(h.tts.overlapping_calls(), 0);
    }

    #[tokio::test]
    async fn test_replay_after_stop_waits_for_cancelled_request() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(30));
        let mut h = harness_with(4, 2, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        // 让 0 的请求真正发出
        settle().await;
        h.controller.stop();
        h.controller.play(None).await.unwrap();

        until_attached(&mut h, 0).await;
        assert_eq!(h.tts.calls_for(0), 2);
        assert_eq!(h.tts.overlapping_calls(), 0);
    }

    #[tokio::test]
    async fn test_rapid_seeks_never_overlap_requests() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(20));
        let mut h = harness_with(12, 2, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        h.controller.seek(6).await.unwrap();
        assert!(h.controller.pending().count(ClaimKind::Prefetch) <= 2);
        h.controller.next().await.unwrap();
        assert!(h.controller.pending().count(ClaimKind::Prefetch) <= 2);
        h.controller.seek(1).await.unwrap();

        until_attached(&mut h, 1).await;
        settle().await;

        assert_eq!(h.tts.overlapping_calls(), 0);
    }

    #[tokio::test]
    async fn test_foreground_waits_for_in_flight_prefetch() {
        let tts = ScriptedTts::new().with_delay(Duration::from_millis(20));
        let mut h = harness_with(5, 3, tts, MemoryPositions::new());

        h.controller.play(None).await.unwrap();
        h.controller.next().await.unwrap();
        until_attached(&mut h, 1).await;

        assert_eq!(h.tts.calls_for(1), 1);
    }

    #[tokio::test]
    async fn test_next_is_noop_on_last_chunk() {
        let mut h = harness(3, 2);

        h.controller.seek(2).await.unwrap();
        until_attached(&mut h, 2).await;

        h.controller.next().await.unwrap();
        assert_eq!(h.controller.state().current_index, 2);
        assert_eq!(h.output.start_count(), 1);
    }

    #[tokio::test]
    async fn test_next_keeps_cache() {
        let mut h = harness(5, 3);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        settle().await;

        h.controller.next().await.unwrap();
        assert_eq!(h.controller.state().current_index, 1);
        // 缓存命中，直接挂载
        assert_eq!(h.output.current_index(), Some(1));
        assert!(h.controller.cache().has(0));
    }

    #[tokio::test]
    async fn test_seek_rejects_out_of_range() {
        let mut h = harness(3, 2);
        let result = h.controller.seek(3).await;
        assert_eq!(
            result,
            Err(TransportError::InvalidIndex {
                index: 3,
                chunk_count: 3
            })
        );
        assert_eq!(h.controller.state().status, PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn test_click_ignored_while_playing() {
        let mut h = harness(5, 2);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        h.controller.click_chunk(3).await.unwrap();
        assert_eq!(h.controller.state().current_index, 0);

        h.controller.pause();
        h.controller.click_chunk(3).await.unwrap();
        assert_eq!(h.controller.state().current_index, 3);
        assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn test_voice_change_rejected_while_playing() {
        let mut h = harness(4, 2);
        let puck = VoiceId::from_catalogue("Puck").unwrap();

        h.controller.play(None).await.unwrap();
        let result = h.controller.set_voice(puck.clone());
        assert!(matches!(result, Err(TransportError::InvalidState(_))));

        h.controller.stop();
        h.controller.set_voice(puck).unwrap();
        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        assert_eq!(h.tts.voices().last().map(String::as_str), Some("Puck"));
        assert_eq!(h.controller.snapshot().voice, "Puck");
    }

    #[tokio::test]
    async fn test_voice_change_while_paused_drops_cached_audio() {
        let mut h = harness(4, 2);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        h.controller.pause();

        h.controller
            .set_voice(VoiceId::from_catalogue("Zephyr").unwrap())
            .unwrap();

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert!(h.controller.cache().is_empty());
        assert_eq!(h.output.current_index(), None);
    }

    #[tokio::test]
    async fn test_rate_applies_to_attached_audio() {
        let mut h = harness(3, 1);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        h.controller.set_rate(PlaybackRate::new(1.5).unwrap());
        assert_eq!(h.output.current_rate(), Some(1.5));
        assert_eq!(h.controller.snapshot().rate, 1.5);
    }

    #[tokio::test]
    async fn test_position_saved_on_each_chunk() {
        let mut h = harness(4, 1);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        h.controller.seek(2).await.unwrap();
        settle().await;

        assert_eq!(h.positions.saved(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_position_failure_does_not_block_playback() {
        let mut h = harness_with(3, 1, ScriptedTts::new(), MemoryPositions::failing());

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn test_output_failure_stops_with_message() {
        let mut h = harness(3, 1);
        h.output.fail_next_start();

        h.controller.play(None).await.unwrap();
        step(&mut h.controller).await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert_eq!(h.controller.message(), "Error playing audio.");
    }

    #[tokio::test]
    async fn test_playback_error_outcome_stops() {
        let mut h = harness(3, 1);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;

        h.output
            .complete_current(PlaybackOutcome::Failed("device lost".to_string()));
        step(&mut h.controller).await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Stopped);
        assert_eq!(h.controller.message(), "Error playing audio.");
    }

    #[tokio::test]
    async fn test_teardown_releases_resources() {
        let mut h = harness(5, 3);

        h.controller.play(None).await.unwrap();
        until_attached(&mut h, 0).await;
        settle().await;

        h.controller.teardown();
        settle().await;

        assert_eq!(h.controller.state().status, PlaybackStatus::Idle);
        assert_eq!(h.controller.ledger().live(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_observers_see_transitions() {
        let mut h = harness(3, 1);
        let mut rx = h.controller.subscribe();

        h.controller.play(None).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, PlaybackStatus::Playing);

        h.controller.stop();
        assert_eq!(rx.borrow_and_update().status, PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_start_index_clamped() {
        let deps = PlaybackDeps {
            tts: Arc::new(ScriptedTts::new()),
            output: Arc::new(ManualOutput::new()),
            positions: Arc::new(MemoryPositions::new()),
        };
        let controller =
            PlaybackController::new(BookId::new(), chunks(3), 9, ControllerConfig::default(), deps);
        assert_eq!(controller.state().current_index, 0);
    }
}
