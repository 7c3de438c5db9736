//! The three-stage actor pipeline (`spec.md` §2, §4).

mod player;
mod preparer;
mod reorder;
mod synthesizer;

pub use player::{spawn as spawn_player, PlayerHandle};
pub use preparer::prepare;
pub use synthesizer::SynthesizerPool;

use crate::types::Clip;

/// An item flowing through queue B (`spec.md` §2).
pub enum PlayerItem {
    Clip(Clip),
    /// Sentinel meaning the synthesizer pool has resolved every Chunk of
    /// `epoch` — successfully, skipped, or dropped as stale. Lets the
    /// Player detect "Stage 2 is idle" (`spec.md` §4.3 step 6) without
    /// holding worker thread handles.
    EndOfStage2 { epoch: u64 },
}

/// Single-slot, latest-wins control mailbox (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMsg {
    Pause,
    Resume,
    Skip,
    Stop,
}
