//! Nayru's synthesis-to-playback engine: the sole subject of the
//! specification this workspace implements (`spec.md` §1).
//!
//! Three pipeline stages — Preparer, Synthesizer, Player — linked by
//! bounded queues around a shared [`control::Control`] block. See
//! [`engine::Engine`] for the public API adapters (`nayru-http`,
//! `nayru-cli`) call verbatim.

pub mod config;
pub mod control;
mod engine;
pub mod error;
mod pipeline;
pub mod sink;
mod text;
pub mod types;
mod wav;

pub use config::{Config, ConfigPatch};
pub use engine::Engine;
pub use error::{ChunkError, EngineError};
pub use types::{Ack, PlaybackState, SpeakAck, Status};
