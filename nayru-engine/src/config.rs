//! User-visible tunables (`spec.md` §3, Config row).

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

pub const SPEED_MIN: f32 = 0.5;
pub const SPEED_MAX: f32 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub kokoro_url: String,
    pub voice: String,
    pub speed: f32,
}

impl Config {
    pub fn new(kokoro_url: impl Into<String>, voice: impl Into<String>, speed: f32) -> Self {
        Self {
            kokoro_url: kokoro_url.into(),
            voice: voice.into(),
            speed,
        }
    }
}

/// A partial update accepted by `set_config` (`spec.md` §4.4): any subset
/// of `{url, voice, speed}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    #[serde(alias = "url", alias = "kokoro_url")]
    pub kokoro_url: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

impl Config {
    /// Merge a patch, validating `speed` stays in `[0.5, 2.0]` before
    /// anything is written (`spec.md` §4.4, §3 invariant on Config).
    pub fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), EngineError> {
        if let Some(speed) = patch.speed {
            if !(SPEED_MIN..=SPEED_MAX).contains(&speed) {
                return Err(EngineError::InvalidConfig(format!(
                    "speed {speed} out of range [{SPEED_MIN}, {SPEED_MAX}]"
                )));
            }
        }
        if let Some(url) = patch.kokoro_url {
            if url.trim().is_empty() {
                return Err(EngineError::InvalidConfig("url must not be empty".into()));
            }
            self.kokoro_url = url;
        }
        if let Some(voice) = patch.voice {
            if voice.trim().is_empty() {
                return Err(EngineError::InvalidConfig("voice must not be empty".into()));
            }
            self.voice = voice;
        }
        if let Some(speed) = patch.speed {
            self.speed = speed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_speed() {
        let mut cfg = Config::new("http://localhost:8880", "af_heart", 1.0);
        let err = cfg
            .apply_patch(ConfigPatch {
                speed: Some(3.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert_eq!(cfg.speed, 1.0);
    }

    #[test]
    fn merges_independent_fields() {
        let mut cfg = Config::new("http://localhost:8880", "af_heart", 1.0);
        cfg.apply_patch(ConfigPatch {
            voice: Some("af_sarah".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.voice, "af_sarah");
        assert_eq!(cfg.kokoro_url, "http://localhost:8880");
    }
}
