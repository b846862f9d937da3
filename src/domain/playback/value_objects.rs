//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};

/// 预置音色
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceInfo {
    pub id: &'static str,
    pub name: &'static str,
}

/// 合成服务的预置音色列表，第一个为默认音色
pub const VOICE_CATALOGUE: &[VoiceInfo] = &[
    VoiceInfo { id: "Kore", name: "Kore (firm)" },
    VoiceInfo { id: "Puck", name: "Puck (upbeat)" },
    VoiceInfo { id: "Charon", name: "Charon (informative)" },
    VoiceInfo { id: "Fenrir", name: "Fenrir (excitable)" },
    VoiceInfo { id: "Aoede", name: "Aoede (breezy)" },
    VoiceInfo { id: "Zephyr", name: "Zephyr (bright)" },
];

/// 音色标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("voice id cannot be empty");
        }
        Ok(Self(id))
    }

    /// 只接受预置列表中的音色
    pub fn from_catalogue(id: &str) -> Option<Self> {
        VOICE_CATALOGUE
            .iter()
            .find(|v| v.id.eq_ignore_ascii_case(id))
            .map(|v| Self(v.id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self(VOICE_CATALOGUE[0].id.to_string())
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放语速 (0.5 - 2.0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;

    pub fn new(rate: f32) -> Result<Self, &'static str> {
        if !rate.is_finite() || !(Self::MIN..=Self::MAX).contains(&rate) {
            return Err("playback rate must be between 0.5 and 2.0");
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self(1.0)
    }
}

impl std::fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}x", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice_is_first_in_catalogue() {
        assert_eq!(VoiceId::default().as_str(), "Kore");
    }

    #[test]
    fn test_voice_from_catalogue() {
        assert_eq!(VoiceId::from_catalogue("puck").unwrap().as_str(), "Puck");
        assert!(VoiceId::from_catalogue("Nobody").is_none());
    }

    #[test]
    fn test_rate_bounds() {
        assert!(PlaybackRate::new(0.5).is_ok());
        assert!(PlaybackRate::new(2.0).is_ok());
        assert!(PlaybackRate::new(0.4).is_err());
        assert!(PlaybackRate::new(2.1).is_err());
        assert!(PlaybackRate::new(f32::NAN).is_err());
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(PlaybackRate::new(1.5).unwrap().to_string(), "1.5x");
    }
}
