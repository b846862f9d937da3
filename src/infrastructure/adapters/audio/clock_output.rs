//! Clock Audio Output - 无设备播放
//!
//! 不输出声音，按资源时长（除以语速）计时，用于服务器部署和测试。
//! 暂停时冻结剩余时长，halt 或控制句柄被丢弃后不再发出完成通知。

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

use crate::application::playback::AudioResource;
use crate::application::ports::{
    ActivePlayback, AudioOutputError, AudioOutputPort, PlaybackControl, PlaybackOutcome,
};
use crate::domain::playback::PlaybackRate;

#[derive(Debug, Clone, Copy)]
struct ClockState {
    paused: bool,
    rate: f32,
    halted: bool,
}

/// 计时播放器
#[derive(Debug, Default)]
pub struct ClockAudioOutput;

impl ClockAudioOutput {
    pub fn new() -> Self {
        Self
    }
}

struct ClockControl {
    state: watch::Sender<ClockState>,
}

impl PlaybackControl for ClockControl {
    fn pause(&mut self) {
        self.state.send_modify(|s| s.paused = true);
    }

    fn resume(&mut self) -> Result<(), AudioOutputError> {
        if self.state.borrow().halted {
            return Err(AudioOutputError::PlaybackFailed("audio already halted".to_string()));
        }
        self.state.send_modify(|s| s.paused = false);
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.state.send_modify(|s| s.rate = rate.value());
    }

    fn halt(&mut self) {
        self.state.send_modify(|s| s.halted = true);
    }
}

async fn run_clock(
    resource: AudioResource,
    mut state: watch::Receiver<ClockState>,
    finished: oneshot::Sender<PlaybackOutcome>,
) {
    // 以 1.0x 计的剩余媒体时长
    let mut remaining = resource.duration().as_secs_f64();

    loop {
        let current = *state.borrow_and_update();
        if current.halted {
            return;
        }
        if current.paused {
            if state.changed().await.is_err() {
                return;
            }
            continue;
        }

        let started = Instant::now();
        let wall = Duration::from_secs_f64(remaining / current.rate as f64);

        tokio::select! {
            _ = tokio::time::sleep(wall) => {
                tracing::trace!(index = resource.index(), "Clock playback finished");
                let _ = finished.send(PlaybackOutcome::Finished);
                return;
            }
            changed = state.changed() => {
                let played = started.elapsed().as_secs_f64() * current.rate as f64;
                remaining = (remaining - played).max(0.0);
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl AudioOutputPort for ClockAudioOutput {
    async fn start(
        &self,
        resource: AudioResource,
        rate: PlaybackRate,
    ) -> Result<ActivePlayback, AudioOutputError> {
        if resource.duration().is_zero() {
            return Err(AudioOutputError::InvalidResource(format!(
                "chunk {} has no audio",
                resource.index()
            )));
        }

        let (state_tx, state_rx) = watch::channel(ClockState {
            paused: false,
            rate: rate.value(),
            halted: false,
        });
        let (finished_tx, finished_rx) = oneshot::channel();

        tokio::spawn(run_clock(resource, state_rx, finished_tx));

        Ok(ActivePlayback {
            control: Box::new(ClockControl { state: state_tx }),
            finished: finished_rx,
        })
    }
}
