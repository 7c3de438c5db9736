//! Stage 2: pipelined upstream fetch + decode (`spec.md` §4.2).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::control::Control;
use crate::error::ChunkError;
use crate::pipeline::reorder::ReorderBuffer;
use crate::pipeline::PlayerItem;
use crate::types::{Chunk, Clip};
use crate::wav::{self, DecodedWav};

const WORKER_COUNT: usize = 2;
const MAX_RETRIES: u32 = 2;
const RETRY_BACKOFF_MS: [u64; 2] = [200, 400];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SpeechRequest<'a> {
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

#[derive(Default)]
struct EpochProgress {
    remaining: u32,
    failed: u32,
    total: u32,
}

/// State shared by the fixed worker pool: per-epoch reordering and
/// per-epoch completion tracking (`spec.md` §4.2, "pending map... emitter
/// drains the map in order").
struct SynthShared {
    reorder: Mutex<HashMap<u64, ReorderBuffer<Clip>>>,
    progress: Mutex<HashMap<u64, EpochProgress>>,
}

pub struct SynthesizerPool {
    queue_a_tx: Sender<Chunk>,
    shared: Arc<SynthShared>,
}

impl SynthesizerPool {
    /// Spawns the fixed worker pool (`spec.md` §4.2: "small fixed worker
    /// pool (default 2 workers)"). Workers live for the engine's lifetime
    /// and pull Chunks belonging to any epoch in submission order.
    pub fn spawn(control: Arc<Control>, queue_b_tx: Sender<PlayerItem>) -> Self {
        let (queue_a_tx, queue_a_rx) = crossbeam_channel::unbounded::<Chunk>();
        let shared = Arc::new(SynthShared {
            reorder: Mutex::new(HashMap::new()),
            progress: Mutex::new(HashMap::new()),
        });
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with this configuration");

        for worker_id in 0..WORKER_COUNT {
            let queue_a_rx = queue_a_rx.clone();
            let queue_b_tx = queue_b_tx.clone();
            let control = control.clone();
            let shared = shared.clone();
            let client = client.clone();
            std::thread::Builder::new()
                .name(format!("nayru-synth-{worker_id}"))
                .spawn(move || worker_loop(&queue_a_rx, &queue_b_tx, &control, &shared, &client))
                .expect("failed to spawn synthesizer worker thread");
        }

        Self { queue_a_tx, shared }
    }

    /// Registers `total` Chunks for `epoch` before any are submitted, so
    /// the first completion already sees an accurate `remaining` count.
    pub fn begin_epoch(&self, epoch: u64, total: u32) {
        self.shared.progress.lock().insert(
            epoch,
            EpochProgress {
                remaining: total,
                failed: 0,
                total,
            },
        );
    }

    pub fn submit(&self, chunk: Chunk) {
        let _ = self.queue_a_tx.send(chunk);
    }
}

fn worker_loop(
    queue_a_rx: &Receiver<Chunk>,
    queue_b_tx: &Sender<PlayerItem>,
    control: &Arc<Control>,
    shared: &Arc<SynthShared>,
    client: &Client,
) {
    while let Ok(chunk) = queue_a_rx.recv() {
        process_chunk(&chunk, queue_b_tx, control, shared, client);
    }
}

fn process_chunk(
    chunk: &Chunk,
    queue_b_tx: &Sender<PlayerItem>,
    control: &Arc<Control>,
    shared: &Arc<SynthShared>,
    client: &Client,
) {
    if control.is_stale(chunk.epoch) {
        skip_reorder_slot(chunk.epoch, chunk.index_in_utterance, control, shared, queue_b_tx);
        finish_chunk(chunk.epoch, false, control, shared, queue_b_tx);
        return;
    }

    let config = control.config_snapshot();
    let result = fetch_and_decode(client, &config, chunk);

    // Step 5 of `spec.md` §4.2: recheck before enqueuing, regardless of
    // how the fetch turned out.
    if control.is_stale(chunk.epoch) {
        skip_reorder_slot(chunk.epoch, chunk.index_in_utterance, control, shared, queue_b_tx);
        finish_chunk(chunk.epoch, false, control, shared, queue_b_tx);
        return;
    }

    match result {
        Ok(decoded) => {
            let clip = Clip {
                epoch: chunk.epoch,
                index_in_utterance: chunk.index_in_utterance,
                sample_rate: decoded.sample_rate,
                channels: decoded.channels,
                samples: decoded.samples,
            };
            emit_clip(clip, control, shared, queue_b_tx);
            finish_chunk(chunk.epoch, true, control, shared, queue_b_tx);
        }
        Err(err) => {
            warn!(index = chunk.index_in_utterance, error = %err, "chunk synthesis failed, skipping");
            control.set_last_error(err.to_string());
            skip_reorder_slot(chunk.epoch, chunk.index_in_utterance, control, shared, queue_b_tx);
            finish_chunk(chunk.epoch, false, control, shared, queue_b_tx);
        }
    }
}

fn emit_clip(clip: Clip, control: &Arc<Control>, shared: &Arc<SynthShared>, queue_b_tx: &Sender<PlayerItem>) {
    let epoch = clip.epoch;
    let mut reorder = shared.reorder.lock();
    let buffer = reorder.entry(epoch).or_insert_with(ReorderBuffer::new);
    buffer.complete(clip.index_in_utterance, clip, |_, ready| {
        control.inc_queue_length();
        let _ = queue_b_tx.send(PlayerItem::Clip(ready));
    });
}

/// A chunk that failed or was dropped as stale still occupies a slot in
/// the ordering sequence; without marking it resolved, every later index
/// would stay parked in the reorder buffer forever (`spec.md` §4.2: a
/// skipped chunk must not block chunks after it).
fn skip_reorder_slot(epoch: u64, index: u32, control: &Arc<Control>, shared: &Arc<SynthShared>, queue_b_tx: &Sender<PlayerItem>) {
    let mut reorder = shared.reorder.lock();
    let buffer = reorder.entry(epoch).or_insert_with(ReorderBuffer::new);
    buffer.skip(index, |_, ready: Clip| {
        control.inc_queue_length();
        let _ = queue_b_tx.send(PlayerItem::Clip(ready));
    });
}

fn finish_chunk(
    epoch: u64,
    succeeded: bool,
    control: &Arc<Control>,
    shared: &Arc<SynthShared>,
    queue_b_tx: &Sender<PlayerItem>,
) {
    let mut progress_map = shared.progress.lock();
    let all_failed = match progress_map.get_mut(&epoch) {
        Some(progress) => {
            if !succeeded {
                progress.failed += 1;
            }
            progress.remaining = progress.remaining.saturating_sub(1);
            if progress.remaining == 0 {
                let all_failed = progress.total > 0 && progress.failed == progress.total;
                progress_map.remove(&epoch);
                Some(all_failed)
            } else {
                None
            }
        }
        None => None,
    };
    drop(progress_map);

    if let Some(all_failed) = all_failed {
        if all_failed {
            control.set_last_error(
                ChunkError::AllFailed {
                    total: control.total(),
                }
                .to_string(),
            );
        }
        shared.reorder.lock().remove(&epoch);
        let _ = queue_b_tx.send(PlayerItem::EndOfStage2 { epoch });
    }
}

fn fetch_and_decode(client: &Client, config: &Config, chunk: &Chunk) -> Result<DecodedWav, ChunkError> {
    let mut attempt = 0u32;
    loop {
        match try_fetch_once(client, config, chunk) {
            Ok(decoded) => return Ok(decoded),
            Err(err) if err.is_retryable() && attempt < MAX_RETRIES => {
                let backoff = RETRY_BACKOFF_MS[attempt as usize];
                debug!(
                    index = chunk.index_in_utterance,
                    attempt,
                    backoff_ms = backoff,
                    "retrying chunk after transient upstream failure"
                );
                std::thread::sleep(Duration::from_millis(backoff));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn try_fetch_once(client: &Client, config: &Config, chunk: &Chunk) -> Result<DecodedWav, ChunkError> {
    let index = chunk.index_in_utterance;
    let body = SpeechRequest {
        input: &chunk.text,
        voice: &chunk.voice,
        speed: chunk.speed,
        response_format: "wav",
    };
    let url = format!("{}/v1/audio/speech", config.kokoro_url.trim_end_matches('/'));

    let response = client.post(&url).json(&body).send().map_err(|e| {
        if e.is_timeout() || e.is_connect() {
            ChunkError::Transient {
                index,
                reason: e.to_string(),
            }
        } else {
            ChunkError::Fatal {
                index,
                reason: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if status.is_server_error() {
        return Err(ChunkError::Transient {
            index,
            reason: format!("upstream returned {status}"),
        });
    }
    if !status.is_success() {
        return Err(ChunkError::Fatal {
            index,
            reason: format!("upstream returned {status}"),
        });
    }

    let bytes = response.bytes().map_err(|e| ChunkError::Transient {
        index,
        reason: e.to_string(),
    })?;

    wav::decode(&bytes).map_err(|e| ChunkError::Fatal {
        index,
        reason: e.to_string(),
    })
}
