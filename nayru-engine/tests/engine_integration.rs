//! Engine-level integration tests against a `wiremock` stand-in for the
//! upstream TTS endpoint, exercising the testable properties of
//! `spec.md` §8.

use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use nayru_engine::sink::{AudioSink, SharedFakeSink};
use nayru_engine::{Config, Engine, PlaybackState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 24000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn ok_wav_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(wav_bytes(&[1, -1, 2, -2]))
        .insert_header("content-type", "audio/wav")
}

async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return condition();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn engine_with_fake_sink(url: impl Into<String>) -> (Engine, SharedFakeSink) {
    let shared = SharedFakeSink::new();
    let for_engine = shared.clone();
    let config = Config::new(url, "af_heart", 1.0);
    let engine = Engine::with_sink(config, |_| Ok(Box::new(for_engine) as Box<dyn AudioSink>)).unwrap();
    (engine, shared)
}

/// Testable property 3 (in-order playback) + end-to-end scenario (a).
#[tokio::test]
async fn speak_plays_all_chunks_then_returns_to_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ok_wav_response())
        .mount(&server)
        .await;

    let (engine, sink) = engine_with_fake_sink(server.uri());

    let ack = engine.speak("Hello. World.").unwrap();
    assert_eq!(ack.queued_chunks, 2);

    let reached_idle = wait_until(
        || engine.status().state == PlaybackState::Idle,
        Duration::from_secs(5),
    )
    .await;
    assert!(reached_idle, "engine never returned to idle: {:?}", engine.status());

    let status = engine.status();
    assert_eq!(status.current_sentence_index, None);
    assert_eq!(status.total_sentences, 0, "chunk count must reset once idle again");
    assert_eq!(sink.0.lock().appended.len(), 2);
}

/// Testable property 1 (cancellation liveness) + end-to-end scenario (b).
#[tokio::test]
async fn stop_returns_to_idle_quickly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ok_wav_response().set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (engine, _sink) = engine_with_fake_sink(server.uri());

    engine.speak("A. B. C.").unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.stop();

    let reached_idle = wait_until(
        || engine.status().state == PlaybackState::Idle,
        Duration::from_millis(700),
    )
    .await;
    assert!(reached_idle, "stop() did not reach idle in time");
    assert_eq!(engine.status().total_sentences, 0);
}

/// Testable property 2 (epoch monotonicity) + end-to-end scenario (c):
/// a rapid second `speak` supersedes the first — only the second
/// utterance's text is ever appended to the sink.
#[tokio::test]
async fn rapid_second_speak_supersedes_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ok_wav_response().set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    let (engine, _sink) = engine_with_fake_sink(server.uri());

    engine.speak("One.").unwrap();
    let ack_two = engine.speak("Two.").unwrap();
    assert_eq!(ack_two.queued_chunks, 1);

    let reached_idle = wait_until(
        || engine.status().state == PlaybackState::Idle,
        Duration::from_secs(3),
    )
    .await;
    assert!(reached_idle);

    // Every request actually reaching the upstream must carry "Two.";
    // "One." was cancelled before any of its chunks could be enqueued,
    // or its Clip was dropped as stale before reaching the sink.
    let requests = server.received_requests().await.unwrap_or_default();
    for request in &requests {
        let body = String::from_utf8_lossy(&request.body);
        assert!(!body.contains("\"input\":\"One.\""), "stale utterance reached upstream: {body}");
    }
}

/// Pads a marker into its own sentence long enough (> `MERGE_TARGET`) that
/// the Preparer never merges it with its neighbors, so each one becomes a
/// distinct, individually addressable Chunk.
fn padded_sentence(marker: &str) -> String {
    format!("{marker} {}.", "x".repeat(290))
}

/// End-to-end scenario (e): one chunk fails, the rest play, `last_error`
/// records the failure, and the engine still returns to Idle.
#[tokio::test]
async fn single_chunk_failure_is_skipped_and_recorded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(BodyContains("BRAVO".to_string()))
        .respond_with(ResponseTemplate::new(400))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ok_wav_response())
        .mount(&server)
        .await;

    let (engine, sink) = engine_with_fake_sink(server.uri());

    let text = format!(
        "{} {} {}",
        padded_sentence("ALPHA"),
        padded_sentence("BRAVO"),
        padded_sentence("CHARLIE")
    );
    let ack = engine.speak(&text).unwrap();
    assert_eq!(ack.queued_chunks, 3);

    let reached_idle = wait_until(
        || engine.status().state == PlaybackState::Idle,
        Duration::from_secs(5),
    )
    .await;
    assert!(reached_idle, "engine never returned to idle: {:?}", engine.status());

    let status = engine.status();
    assert!(status.last_error.is_some(), "expected a recorded chunk failure");
    assert_eq!(sink.0.lock().appended.len(), 2, "only the two surviving chunks should reach the sink");
}

struct BodyContains(String);

impl wiremock::Match for BodyContains {
    fn matches(&self, request: &Request) -> bool {
        String::from_utf8_lossy(&request.body).contains(&self.0)
    }
}
