//! Public façade (`spec.md` §4.4). Every adapter method maps 1:1 to one
//! of these calls.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, ConfigPatch};
use crate::control::Control;
use crate::error::EngineError;
use crate::pipeline::{self, ControlMsg, PlayerHandle, SynthesizerPool};
use crate::sink::{AudioSink, RodioSink};
use crate::types::{Ack, PlaybackState, SpeakAck, Status};

/// Queue B capacity (`spec.md` §4.2: "default 4 Clips").
const QUEUE_B_CAPACITY: usize = 4;

pub struct Engine {
    control: Arc<Control>,
    synth: SynthesizerPool,
    player: PlayerHandle,
}

impl Engine {
    /// Opens the real, native audio output device.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_sink(config, |_| {
            RodioSink::open().map(|sink| Box::new(sink) as Box<dyn AudioSink>)
        })
    }

    /// Constructs the engine with a caller-supplied sink, used in tests to
    /// substitute an in-memory fake for the native audio device
    /// (`SPEC_FULL.md` §E).
    pub fn with_sink(
        config: Config,
        open_sink: impl FnOnce(&Config) -> Result<Box<dyn AudioSink>, String>,
    ) -> Result<Self, EngineError> {
        let sink = open_sink(&config).map_err(EngineError::Sink)?;
        let control = Control::new(config);
        let (queue_b_tx, queue_b_rx) = crossbeam_channel::bounded(QUEUE_B_CAPACITY);
        let player = pipeline::spawn_player(control.clone(), queue_b_rx, sink);
        let synth = SynthesizerPool::spawn(control.clone(), queue_b_tx);

        Ok(Self {
            control,
            synth,
            player,
        })
    }

    /// `spec.md` §4.4 `speak`: bumps the epoch, re-tokenizes, restarts
    /// Stages 2/3 for the new epoch, returns immediately.
    pub fn speak(&self, text: &str) -> Result<SpeakAck, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::InvalidInput);
        }

        let epoch = self.control.bump_epoch();
        info!(epoch, "speak: new utterance");
        self.control.clear_last_error();
        // Equivalent to stop() then speak(), atomically via the epoch bump
        // (`spec.md` §4.4): wake a possibly-Paused player and reset its sink.
        self.player.send(ControlMsg::Stop);

        let config = self.control.config_snapshot();
        let chunks = pipeline::prepare(epoch, text, &config);
        let total = chunks.len() as u32;

        self.control.set_total(total);
        self.control.clear_current_index();

        if total == 0 {
            self.control.set_state(PlaybackState::Idle);
            return Ok(SpeakAck {
                queued_chunks: 0,
                state: PlaybackState::Idle,
                current_sentence_index: None,
                total_sentences: 0,
            });
        }

        self.control.set_state(PlaybackState::Converting);
        self.synth.begin_epoch(epoch, total);
        for chunk in chunks {
            self.synth.submit(chunk);
        }

        Ok(SpeakAck {
            queued_chunks: total,
            state: self.control.state(),
            current_sentence_index: self.control.current_index(),
            total_sentences: total,
        })
    }

    /// `spec.md` §4.4 `stop`: bumps the epoch, drains all queues, clears
    /// the sink, returns to Idle. Never fails.
    pub fn stop(&self) -> Ack {
        self.control.bump_epoch();
        info!("stop");
        self.control.clear_last_error();
        self.player.send(ControlMsg::Stop);
        Ack::default()
    }

    /// `spec.md` §4.4 `pause`: no-op unless currently Playing.
    pub fn pause(&self) -> Ack {
        self.player.send(ControlMsg::Pause);
        Ack::default()
    }

    /// `spec.md` §4.4 `resume`: no-op unless currently Paused.
    pub fn resume(&self) -> Ack {
        self.player.send(ControlMsg::Resume);
        Ack::default()
    }

    /// `spec.md` §4.4 `skip`: advance past the current Clip. No-op if Idle.
    pub fn skip(&self) -> Status {
        if self.control.state() != PlaybackState::Idle {
            self.player.send(ControlMsg::Skip);
        }
        self.control.status()
    }

    /// `spec.md` §4.4 `status`: never fails.
    pub fn status(&self) -> Status {
        self.control.status()
    }

    /// `spec.md` §4.4 `set_config`: merges a partial update, validated
    /// before anything is written.
    pub fn set_config(&self, patch: ConfigPatch) -> Result<Ack, EngineError> {
        let mut config = self.control.config_snapshot();
        config.apply_patch(patch)?;
        self.control.set_config(config);
        Ok(Ack::default())
    }

    /// `spec.md` §4.4 `get_config`: never fails.
    pub fn get_config(&self) -> Config {
        self.control.config_snapshot()
    }
}
