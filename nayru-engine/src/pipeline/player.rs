//! Stage 3: gapless playback on a dedicated OS thread (`spec.md` §4.3).

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::{Condvar, Mutex};
use tracing::error;

use crate::control::Control;
use crate::pipeline::{ControlMsg, PlayerItem};
use crate::sink::AudioSink;
use crate::types::{Clip, PlaybackState};

const QUEUE_B_RECV_TIMEOUT: Duration = Duration::from_millis(50);

struct Mailbox {
    slot: Mutex<Option<ControlMsg>>,
    condvar: Condvar,
}

/// A handle other threads use to post to the player's single-slot,
/// latest-wins control mailbox.
#[derive(Clone)]
pub struct PlayerHandle {
    mailbox: Arc<Mailbox>,
}

impl PlayerHandle {
    pub fn send(&self, msg: ControlMsg) {
        *self.mailbox.slot.lock() = Some(msg);
        self.mailbox.condvar.notify_all();
    }
}

/// Spawns the player thread. It owns `sink` exclusively for its entire
/// lifetime — no other thread ever touches it (`spec.md` §5).
pub fn spawn(control: Arc<Control>, queue_b_rx: Receiver<PlayerItem>, sink: Box<dyn AudioSink>) -> PlayerHandle {
    let mailbox = Arc::new(Mailbox {
        slot: Mutex::new(None),
        condvar: Condvar::new(),
    });
    let handle = PlayerHandle {
        mailbox: mailbox.clone(),
    };

    std::thread::Builder::new()
        .name("nayru-player".into())
        .spawn(move || run(control, queue_b_rx, sink, mailbox))
        .expect("failed to spawn player thread");

    handle
}

fn run(control: Arc<Control>, queue_b_rx: Receiver<PlayerItem>, mut sink: Box<dyn AudioSink>, mailbox: Arc<Mailbox>) {
    let mut stage2_done_epoch: Option<u64> = None;

    loop {
        if control.state() == PlaybackState::Paused {
            let msg = wait_for_mailbox(&mailbox);
            handle_mailbox(msg, &control, &mut sink);
            continue;
        }

        if let Some(msg) = try_take_mailbox(&mailbox) {
            handle_mailbox(msg, &control, &mut sink);
            continue;
        }

        match queue_b_rx.recv_timeout(QUEUE_B_RECV_TIMEOUT) {
            Ok(PlayerItem::EndOfStage2 { epoch }) => {
                stage2_done_epoch = Some(epoch);
            }
            Ok(PlayerItem::Clip(clip)) => {
                if control.is_stale(clip.epoch) {
                    control.dec_queue_length();
                } else {
                    append_clip(clip, &control, &mut sink);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        maybe_go_idle(&control, sink.as_ref(), stage2_done_epoch);
    }
}

/// Appends one Clip to the sink and returns immediately — it is never
/// held back waiting for a previously appended Clip to drain. This is
/// the gapless handoff `spec.md` §4.3 calls for: consecutive Clips sit
/// back-to-back on the one live sink with no inserted silence, the same
/// way a receive loop that calls `sink.append()` per arriving chunk
/// does it without an intervening `empty()` wait.
///
/// `current_index` therefore tracks the most recently *appended* Clip,
/// which may run slightly ahead of what is audible at any instant; it
/// still only ever advances, satisfying the non-decreasing invariant.
fn append_clip(clip: Clip, control: &Arc<Control>, sink: &mut Box<dyn AudioSink>) {
    control.set_current_index(clip.index_in_utterance);
    control.set_state(PlaybackState::Playing);

    if let Err(err) = sink.append(clip.sample_rate, clip.channels, &clip.samples) {
        error!(error = %err, "audio sink error, returning to idle");
        control.set_last_error(format!("sink error: {err}"));
        control.set_state(PlaybackState::Idle);
        control.clear_current_index();
        return;
    }
    control.dec_queue_length();
}

/// Mailbox commands are polled at most `QUEUE_B_RECV_TIMEOUT` apart,
/// keeping transport control responsive to within `spec.md` §4.3's
/// ≤50 ms bound even while clips keep arriving and get appended gaplessly.
fn handle_mailbox(msg: ControlMsg, control: &Arc<Control>, sink: &mut Box<dyn AudioSink>) {
    match msg {
        ControlMsg::Pause => {
            if control.state() == PlaybackState::Playing {
                sink.pause();
                control.set_state(PlaybackState::Paused);
            }
        }
        ControlMsg::Resume => {
            if control.state() == PlaybackState::Paused {
                sink.resume();
                control.set_state(PlaybackState::Playing);
            }
        }
        ControlMsg::Skip => {
            sink.skip_one();
        }
        ControlMsg::Stop => {
            sink.clear();
            control.clear_current_index();
            control.set_total(0);
            control.set_state(PlaybackState::Idle);
        }
    }
}

/// `spec.md` §4.3 step 6: once B is drained, Stage 2 has resolved every
/// Chunk of the current epoch, and the sink has finished playing, go Idle.
///
/// `total_sentences` resets alongside `current_index` here — the same
/// end-of-scenario state from `spec.md` §8 scenario (a) — so a completed
/// utterance doesn't leave a stale chunk count visible once idle.
fn maybe_go_idle(control: &Arc<Control>, sink: &dyn AudioSink, stage2_done_epoch: Option<u64>) {
    let epoch = control.epoch();
    if stage2_done_epoch == Some(epoch) && sink.empty() && control.state() != PlaybackState::Idle {
        control.clear_current_index();
        control.set_total(0);
        control.set_state(PlaybackState::Idle);
    }
}

fn try_take_mailbox(mailbox: &Arc<Mailbox>) -> Option<ControlMsg> {
    mailbox.slot.lock().take()
}

fn wait_for_mailbox(mailbox: &Arc<Mailbox>) -> ControlMsg {
    let mut slot = mailbox.slot.lock();
    loop {
        if let Some(msg) = slot.take() {
            return msg;
        }
        mailbox.condvar.wait(&mut slot);
    }
}
