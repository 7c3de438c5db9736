//! Audio sink abstraction (`SPEC_FULL.md` §F.3).
//!
//! The Player stage talks to this trait, not to `rodio` directly, so it
//! can be exercised in tests without a native audio device — the same
//! capability-set approach `spec.md` §9 prescribes for the Synthesizer's
//! upstream provider, extended here to the output device.

use std::collections::VecDeque;

use rodio::{OutputStream, OutputStreamHandle, Sink as RodioSinkHandle};

/// What the Player stage needs from an audio output device.
pub trait AudioSink: Send {
    /// (Re)configure the sink for a new sample rate / channel count,
    /// appending `samples` for gapless playback. `spec.md` §4.3:
    /// sample-rate changes between Clips may reopen the sink; a short
    /// (<10 ms) gap is acceptable at those boundaries.
    fn append(&mut self, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<(), String>;

    fn pause(&mut self);
    fn resume(&mut self);

    /// Drop only the item currently playing; anything already queued
    /// behind it keeps playing gaplessly. Backs `skip()` (`spec.md` §4.4).
    fn skip_one(&mut self);

    /// Discard everything queued and currently playing.
    fn clear(&mut self);

    /// True once everything appended so far has finished playing.
    fn empty(&self) -> bool;
}

/// Production sink: a single `rodio::Sink` on a device opened once and
/// reused across Clips, exactly as `koko`'s `ChannelSource`/`Sink` usage
/// and the `contextmirror-voice-mirror` playback module play samples.
pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: RodioSinkHandle,
    current_rate: u32,
    current_channels: u16,
}

impl RodioSink {
    pub fn open() -> Result<Self, String> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| format!("no audio output device: {e}"))?;
        let sink = RodioSinkHandle::try_new(&handle).map_err(|e| format!("failed to open sink: {e}"))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink,
            current_rate: 0,
            current_channels: 0,
        })
    }
}

impl AudioSink for RodioSink {
    fn append(&mut self, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<(), String> {
        // rodio's Sink is tied to neither rate nor channel count per
        // buffer, so simply appending a new SamplesBuffer per Clip is
        // gapless as long as we keep using the same Sink.
        self.current_rate = sample_rate;
        self.current_channels = channels;
        let buffer = rodio::buffer::SamplesBuffer::new(channels, sample_rate, samples.to_vec());
        self.sink.append(buffer);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn skip_one(&mut self) {
        self.sink.skip_one();
    }

    fn clear(&mut self) {
        self.sink.stop();
        // `Sink::stop` tears down the rodio sink's internal queue; a
        // fresh one is needed for subsequent appends.
        if let Ok(new_sink) = RodioSinkHandle::try_new(&self.handle) {
            self.sink = new_sink;
        }
    }

    fn empty(&self) -> bool {
        self.sink.empty()
    }
}

/// In-memory fake used by engine tests (`SPEC_FULL.md` §E): records every
/// buffer it was handed instead of talking to a real device.
///
/// By default playback is instantaneous (`empty()` stays true), which is
/// what most pipeline tests want — they only care that Clips arrived in
/// order. Setting `instant = false` lets a test hold a Clip "in flight"
/// (via [`FakeSink::drain`]) to exercise pause/skip/stop mid-playback.
pub struct FakeSink {
    pub appended: Vec<(u32, u16, Vec<i16>)>,
    pub paused: bool,
    pub cleared_count: u32,
    pub skipped_count: u32,
    pub instant: bool,
    /// One entry per Clip still "in flight", in append order, so
    /// `skip_one` can drop only the head instead of everything queued.
    remaining: VecDeque<usize>,
}

impl Default for FakeSink {
    fn default() -> Self {
        Self {
            appended: Vec::new(),
            paused: false,
            cleared_count: 0,
            skipped_count: 0,
            instant: true,
            remaining: VecDeque::new(),
        }
    }
}

impl AudioSink for FakeSink {
    fn append(&mut self, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<(), String> {
        if !self.instant {
            self.remaining.push_back(samples.len().max(1));
        }
        self.appended.push((sample_rate, channels, samples.to_vec()));
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn skip_one(&mut self) {
        self.skipped_count += 1;
        self.remaining.pop_front();
    }

    fn clear(&mut self) {
        self.cleared_count += 1;
        self.remaining.clear();
    }

    fn empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl FakeSink {
    /// Test helper: pretend everything appended so far finished playing.
    pub fn drain(&mut self) {
        self.remaining.clear();
    }
}

/// A [`FakeSink`] shared with the test that spawned the Player, so
/// assertions can run while the Player thread is still alive.
#[derive(Clone)]
pub struct SharedFakeSink(pub std::sync::Arc<parking_lot::Mutex<FakeSink>>);

impl SharedFakeSink {
    pub fn new() -> Self {
        Self(std::sync::Arc::new(parking_lot::Mutex::new(FakeSink::default())))
    }
}

impl Default for SharedFakeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for SharedFakeSink {
    fn append(&mut self, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<(), String> {
        self.0.lock().append(sample_rate, channels, samples)
    }

    fn pause(&mut self) {
        self.0.lock().pause();
    }

    fn resume(&mut self) {
        self.0.lock().resume();
    }

    fn skip_one(&mut self) {
        self.0.lock().skip_one();
    }

    fn clear(&mut self) {
        self.0.lock().clear();
    }

    fn empty(&self) -> bool {
        self.0.lock().empty()
    }
}
