//! Audio Output Adapter - 音频播放实现

mod clock_output;
#[cfg(feature = "device-audio")]
mod rodio_output;

pub use clock_output::ClockAudioOutput;
#[cfg(feature = "device-audio")]
pub use rodio_output::RodioAudioOutput;
