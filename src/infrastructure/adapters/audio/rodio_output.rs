//! Rodio Audio Output - 本地声卡播放
//!
//! `OutputStream` 在部分平台上不是 `Send`，因此放在专用线程中持有，
//! 适配器只保存可跨线程的 `OutputStreamHandle`。每段音频使用独立的 Sink，
//! 由一个等待线程在队列播放完毕时发出完成通知。

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

use crate::application::playback::AudioResource;
use crate::application::ports::{
    ActivePlayback, AudioOutputError, AudioOutputPort, PlaybackControl, PlaybackOutcome,
};
use crate::domain::playback::PlaybackRate;

/// 默认输出设备播放器
pub struct RodioAudioOutput {
    handle: OutputStreamHandle,
    /// 丢弃时音频线程退出并释放设备
    _shutdown: mpsc::Sender<()>,
}

impl RodioAudioOutput {
    /// 打开默认输出设备
    pub fn new() -> Result<Self, AudioOutputError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<OutputStreamHandle, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("readaloud-audio".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = ready_tx.send(Ok(handle));
                    // 阻塞直到适配器被丢弃
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("Audio output thread exiting");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| {
                AudioOutputError::DeviceUnavailable(format!("failed to spawn audio thread: {e}"))
            })?;

        let handle = ready_rx
            .recv()
            .map_err(|_| AudioOutputError::DeviceUnavailable("audio thread died".to_string()))?
            .map_err(AudioOutputError::DeviceUnavailable)?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            handle,
            _shutdown: shutdown_tx,
        })
    }
}

struct RodioControl {
    sink: Arc<Sink>,
    halted: Arc<AtomicBool>,
    /// 播放期间持有资源
    _resource: AudioResource,
}

impl PlaybackControl for RodioControl {
    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) -> Result<(), AudioOutputError> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(AudioOutputError::PlaybackFailed("audio already halted".to_string()));
        }
        self.sink.play();
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.sink.set_speed(rate.value());
    }

    fn halt(&mut self) {
        self.halted.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}

impl Drop for RodioControl {
    fn drop(&mut self) {
        self.halt();
    }
}

#[async_trait]
impl AudioOutputPort for RodioAudioOutput {
    async fn start(
        &self,
        resource: AudioResource,
        rate: PlaybackRate,
    ) -> Result<ActivePlayback, AudioOutputError> {
        let source = Decoder::new(Cursor::new(resource.wav().to_vec()))
            .map_err(|e| AudioOutputError::InvalidResource(e.to_string()))?;

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AudioOutputError::DeviceUnavailable(e.to_string()))?;
        sink.set_speed(rate.value());
        sink.append(source);
        let sink = Arc::new(sink);

        let halted = Arc::new(AtomicBool::new(false));
        let (finished_tx, finished_rx) = oneshot::channel();

        let watcher_sink = Arc::clone(&sink);
        let watcher_halted = Arc::clone(&halted);
        let index = resource.index();
        // stop() 会清空队列，sleep_until_end 随即返回
        std::thread::spawn(move || {
            watcher_sink.sleep_until_end();
            if watcher_halted.load(Ordering::SeqCst) {
                return;
            }
            tracing::debug!(index, "Chunk playback finished naturally");
            let _ = finished_tx.send(PlaybackOutcome::Finished);
        });

        tracing::debug!(index, rate = rate.value(), "Audio playback started");

        Ok(ActivePlayback {
            control: Box::new(RodioControl {
                sink,
                halted,
                _resource: resource,
            }),
            finished: finished_rx,
        })
    }
}
