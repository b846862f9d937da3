//! 应用层测试用的替身实现

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::application::playback::AudioResource;
use crate::application::ports::{
    ActivePlayback, AudioOutputError, AudioOutputPort, BookRepositoryPort, PersistenceError,
    PlaybackControl, PlaybackOutcome, PositionStorePort, RepositoryError, SynthesisError,
    SynthesisRequest, SynthesizedSpeech, TtsEnginePort, TTS_SAMPLE_RATE,
};
use crate::domain::book::{Book, BookId};
use crate::domain::playback::PlaybackRate;
use crate::domain::TextChunk;

/// 生成 n 个片段，文本为 "Sentence number {i}."
pub fn chunks(n: usize) -> Vec<TextChunk> {
    (0..n)
        .map(|index| TextChunk {
            index,
            text: format!("Sentence number {}.", index),
        })
        .collect()
}

fn index_of(text: &str) -> usize {
    text.trim_start_matches("Sentence number ")
        .trim_end_matches('.')
        .parse()
        .unwrap_or(usize::MAX)
}

/// 让出执行权，使已 spawn 的任务跑完
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// 可编排的合成服务
#[derive(Default)]
pub struct ScriptedTts {
    calls: Mutex<HashMap<usize, usize>>,
    voices: Mutex<Vec<String>>,
    fail_on: Mutex<HashSet<usize>>,
    delay: Option<Duration>,
    silent: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    active: Mutex<HashSet<usize>>,
    overlapping: AtomicUsize,
}

impl ScriptedTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_silence(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn failing_on(self, index: usize) -> Self {
        self.fail_on.lock().unwrap().insert(index);
        self
    }

    pub fn calls_for(&self, index: usize) -> usize {
        self.calls.lock().unwrap().get(&index).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// 同一索引已有请求在进行时又收到请求的次数
    pub fn overlapping_calls(&self) -> usize {
        self.overlapping.load(Ordering::SeqCst)
    }
}

struct InFlight<'a> {
    tts: &'a ScriptedTts,
    index: usize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tts.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.tts.active.lock().unwrap().remove(&self.index);
    }
}

#[async_trait]
impl TtsEnginePort for ScriptedTts {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedSpeech, SynthesisError> {
        let index = index_of(&request.text);
        *self.calls.lock().unwrap().entry(index).or_default() += 1;
        self.voices
            .lock()
            .unwrap()
            .push(request.voice.as_str().to_string());

        if !self.active.lock().unwrap().insert(index) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight { tts: self, index };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.lock().unwrap().contains(&index) {
            return Err(SynthesisError::ServiceError(format!("scripted failure for {}", index)));
        }

        let pcm = if self.silent { Vec::new() } else { vec![0u8; 480] };
        Ok(SynthesizedSpeech {
            pcm,
            sample_rate: TTS_SAMPLE_RATE,
            channels: 1,
        })
    }
}

/// 手动控制完成时机的播放器
#[derive(Debug, Default)]
pub struct Track {
    pub index: usize,
    pub resource: Option<AudioResource>,
    pub finished: Option<oneshot::Sender<PlaybackOutcome>>,
    pub paused: bool,
    pub halted: bool,
    pub rate: f32,
}

#[derive(Default)]
pub struct ManualOutput {
    tracks: Arc<Mutex<Vec<Arc<Mutex<Track>>>>>,
    fail_start: AtomicBool,
}

impl ManualOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn start_count(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    fn current(&self) -> Option<Arc<Mutex<Track>>> {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|track| !track.lock().unwrap().halted)
            .cloned()
    }

    /// 正在播放（未被 halt）的片段
    pub fn current_index(&self) -> Option<usize> {
        self.current().map(|track| track.lock().unwrap().index)
    }

    pub fn current_paused(&self) -> Option<bool> {
        self.current().map(|track| track.lock().unwrap().paused)
    }

    pub fn current_rate(&self) -> Option<f32> {
        self.current().map(|track| track.lock().unwrap().rate)
    }

    /// 让当前音频自然结束
    pub fn finish_current(&self) {
        self.complete_current(PlaybackOutcome::Finished);
    }

    pub fn complete_current(&self, outcome: PlaybackOutcome) {
        let track = self.current().expect("no track playing");
        let mut track = track.lock().unwrap();
        track.halted = true;
        track.resource = None;
        if let Some(finished) = track.finished.take() {
            let _ = finished.send(outcome);
        }
    }
}

struct ManualControl {
    track: Arc<Mutex<Track>>,
}

impl PlaybackControl for ManualControl {
    fn pause(&mut self) {
        self.track.lock().unwrap().paused = true;
    }

    fn resume(&mut self) -> Result<(), AudioOutputError> {
        self.track.lock().unwrap().paused = false;
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.track.lock().unwrap().rate = rate.value();
    }

    fn halt(&mut self) {
        let mut track = self.track.lock().unwrap();
        track.halted = true;
        track.resource = None;
        track.finished = None;
    }
}

#[async_trait]
impl AudioOutputPort for ManualOutput {
    async fn start(
        &self,
        resource: AudioResource,
        rate: PlaybackRate,
    ) -> Result<ActivePlayback, AudioOutputError> {
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(AudioOutputError::InvalidResource("scripted failure".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        let track = Arc::new(Mutex::new(Track {
            index: resource.index(),
            resource: Some(resource),
            finished: Some(tx),
            paused: false,
            halted: false,
            rate: rate.value(),
        }));
        self.tracks.lock().unwrap().push(Arc::clone(&track));

        Ok(ActivePlayback {
            control: Box::new(ManualControl { track }),
            finished: rx,
        })
    }
}

/// 内存中的位置存储，记录每一次保存
#[derive(Default)]
pub struct MemoryPositions {
    saved: Mutex<Vec<(BookId, usize)>>,
    failing: AtomicBool,
}

impl MemoryPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn saved(&self) -> Vec<usize> {
        self.saved.lock().unwrap().iter().map(|(_, i)| *i).collect()
    }
}

#[async_trait]
impl PositionStorePort for MemoryPositions {
    async fn save_position(&self, book_id: BookId, index: usize) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Storage("scripted failure".to_string()));
        }
        self.saved.lock().unwrap().push((book_id, index));
        Ok(())
    }

    async fn load_position(&self, book_id: BookId) -> Result<usize, PersistenceError> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == book_id)
            .map(|(_, index)| *index)
            .ok_or(PersistenceError::BookNotFound(book_id))
    }
}

/// 内存书库，同时充当位置存储
#[derive(Default)]
pub struct MemoryLibrary {
    books: Mutex<HashMap<BookId, Book>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(book: Book) -> Self {
        let library = Self::default();
        library.books.lock().unwrap().insert(book.id(), book);
        library
    }

    pub fn position_of(&self, book_id: BookId) -> Option<usize> {
        self.books
            .lock()
            .unwrap()
            .get(&book_id)
            .map(|book| book.last_position())
    }
}

#[async_trait]
impl BookRepositoryPort for MemoryLibrary {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        self.books.lock().unwrap().insert(book.id(), book.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.books.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let mut books: Vec<Book> = self.books.lock().unwrap().values().cloned().collect();
        books.sort_by_key(|book| book.created_at());
        Ok(books)
    }

    async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        self.books
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl PositionStorePort for MemoryLibrary {
    async fn save_position(&self, book_id: BookId, index: usize) -> Result<(), PersistenceError> {
        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(&book_id)
            .ok_or(PersistenceError::BookNotFound(book_id))?;
        book.set_last_position(index);
        Ok(())
    }

    async fn load_position(&self, book_id: BookId) -> Result<usize, PersistenceError> {
        self.position_of(book_id)
            .ok_or(PersistenceError::BookNotFound(book_id))
    }
}
