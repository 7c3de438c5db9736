//! Shared data types flowing through the pipeline (`spec.md` §3).

use serde::{Deserialize, Serialize};

/// One call to [`crate::Engine::speak`], before it is split into [`Chunk`]s.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub epoch: u64,
    pub text: String,
}

/// One synthesizable unit: roughly a sentence, possibly merged with its
/// neighbors (`spec.md` §4.1).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub epoch: u64,
    pub index_in_utterance: u32,
    pub text: String,
    pub voice: String,
    pub speed: f32,
}

/// Decoded PCM audio for one [`Chunk`].
#[derive(Debug, Clone)]
pub struct Clip {
    pub epoch: u64,
    pub index_in_utterance: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

/// `Control.state` (`spec.md` §4.4 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Converting,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Converting => "converting",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

/// Snapshot returned by [`crate::Engine::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub state: PlaybackState,
    pub current_sentence_index: Option<u32>,
    pub total_sentences: u32,
    pub queue_length: u32,
    pub voice: String,
    pub speed: f32,
    pub last_error: Option<String>,
}

/// Result of a successful [`crate::Engine::speak`] call.
#[derive(Debug, Clone, Serialize)]
pub struct SpeakAck {
    pub queued_chunks: u32,
    pub state: PlaybackState,
    pub current_sentence_index: Option<u32>,
    pub total_sentences: u32,
}

/// Plain `{ok: true}` acknowledgement shared by the no-fail façade methods.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Default for Ack {
    fn default() -> Self {
        Self { ok: true }
    }
}
