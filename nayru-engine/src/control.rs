//! The process-wide shared record of state, epoch, queue length and
//! config (`spec.md` §3, Control row; §9 "Cyclic references avoided").
//!
//! `Control` owns no references back into the pipeline stages — it is a
//! value-only record read through atomics and a `parking_lot::RwLock`
//! snapshot for `Config`. Every stage holds only an `Arc<Control>`.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::types::{PlaybackState, Status};

const NO_INDEX: u32 = u32::MAX;

fn state_to_u8(state: PlaybackState) -> u8 {
    match state {
        PlaybackState::Idle => 0,
        PlaybackState::Converting => 1,
        PlaybackState::Playing => 2,
        PlaybackState::Paused => 3,
    }
}

fn state_from_u8(v: u8) -> PlaybackState {
    match v {
        1 => PlaybackState::Converting,
        2 => PlaybackState::Playing,
        3 => PlaybackState::Paused,
        _ => PlaybackState::Idle,
    }
}

pub struct Control {
    epoch: AtomicU64,
    state: AtomicU8,
    current_index: AtomicU32,
    total: AtomicU32,
    queue_length: AtomicU32,
    config: RwLock<Config>,
    last_error: RwLock<Option<String>>,
}

impl Control {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            epoch: AtomicU64::new(0),
            state: AtomicU8::new(state_to_u8(PlaybackState::Idle)),
            current_index: AtomicU32::new(NO_INDEX),
            total: AtomicU32::new(0),
            queue_length: AtomicU32::new(0),
            config: RwLock::new(config),
            last_error: RwLock::new(None),
        })
    }

    /// Bumps the epoch and returns the new value. Used by `speak()` and
    /// `stop()` alike (`spec.md` §5, cancellation protocol).
    pub fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invariant 1 of `spec.md` §3: a Clip/Chunk older than the current
    /// epoch must be silently discarded.
    pub fn is_stale(&self, item_epoch: u64) -> bool {
        item_epoch < self.epoch()
    }

    pub fn state(&self) -> PlaybackState {
        state_from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: PlaybackState) {
        self.state.store(state_to_u8(state), Ordering::SeqCst);
    }

    /// Compare-and-swap so a stale stage can't clobber a state transition
    /// already made for a newer epoch.
    pub fn cas_state(&self, current: PlaybackState, new: PlaybackState) -> bool {
        self.state
            .compare_exchange(
                state_to_u8(current),
                state_to_u8(new),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    pub fn current_index(&self) -> Option<u32> {
        match self.current_index.load(Ordering::SeqCst) {
            NO_INDEX => None,
            v => Some(v),
        }
    }

    /// `current_index` is monotonically non-decreasing within an epoch
    /// (`spec.md` §3 invariant 4); callers only ever advance it forward.
    pub fn set_current_index(&self, index: u32) {
        self.current_index.store(index, Ordering::SeqCst);
    }

    pub fn clear_current_index(&self) {
        self.current_index.store(NO_INDEX, Ordering::SeqCst);
    }

    pub fn total(&self) -> u32 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn set_total(&self, total: u32) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn queue_length(&self) -> u32 {
        self.queue_length.load(Ordering::SeqCst)
    }

    pub fn inc_queue_length(&self) {
        self.queue_length.fetch_add(1, Ordering::SeqCst);
    }

    pub fn dec_queue_length(&self) {
        self.queue_length
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_sub(1))
            })
            .ok();
    }

    /// Snapshot read; Chunk construction reads this once per chunk so
    /// config updates take effect at the next chunk boundary
    /// (`spec.md` §3 invariant 5, §8 property 4).
    pub fn config_snapshot(&self) -> Config {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: Config) {
        *self.config.write() = config;
    }

    pub fn set_last_error(&self, message: impl Into<String>) {
        *self.last_error.write() = Some(message.into());
    }

    pub fn clear_last_error(&self) {
        *self.last_error.write() = None;
    }

    pub fn status(&self) -> Status {
        let config = self.config_snapshot();
        Status {
            state: self.state(),
            current_sentence_index: self.current_index(),
            total_sentences: self.total(),
            queue_length: self.queue_length(),
            voice: config.voice,
            speed: config.speed,
            last_error: self.last_error.read().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_strictly_increases() {
        let control = Control::new(Config::new("http://x", "af_heart", 1.0));
        let e1 = control.bump_epoch();
        let e2 = control.bump_epoch();
        assert!(e2 > e1);
    }

    #[test]
    fn stale_detection_uses_current_epoch() {
        let control = Control::new(Config::new("http://x", "af_heart", 1.0));
        control.bump_epoch();
        assert!(control.is_stale(0));
        assert!(!control.is_stale(1));
    }

    #[test]
    fn current_index_resets_to_none() {
        let control = Control::new(Config::new("http://x", "af_heart", 1.0));
        control.set_current_index(3);
        assert_eq!(control.current_index(), Some(3));
        control.clear_current_index();
        assert_eq!(control.current_index(), None);
    }
}
