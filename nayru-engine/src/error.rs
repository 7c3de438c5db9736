//! Error taxonomy from `spec.md` §7.

use thiserror::Error;

/// Structural errors that fail the calling façade method outright.
/// Upstream/sink trouble never lands here — see [`ChunkError`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("text must not be empty")]
    InvalidInput,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("audio sink error: {0}")]
    Sink(String),
}

/// Chunk-scoped failure. Never propagated out of a façade method; it is
/// recorded on `Control.last_error` and surfaced through `status()`
/// (`spec.md` §7: "User-visible failure is therefore degradation, not
/// exception").
#[derive(Debug, Error, Clone)]
pub enum ChunkError {
    #[error("upstream transient failure for chunk {index}: {reason}")]
    Transient { index: u32, reason: String },

    #[error("upstream fatal failure for chunk {index}: {reason}")]
    Fatal { index: u32, reason: String },

    #[error("all {total} chunks of the utterance failed")]
    AllFailed { total: u32 },
}

impl ChunkError {
    /// Transient failures (`spec.md` §4.2) get up to 2 retries; fatal ones
    /// (4xx, malformed WAV) never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChunkError::Transient { .. })
    }
}
