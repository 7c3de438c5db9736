use std::sync::Arc;

use clap::{Parser, Subcommand};
use nayru_engine::{Config, Engine, Status};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nayru", about = "Local voice TTS server and client")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Start the engine and host the HTTP API
    Serve {
        /// Port to bind the HTTP API on
        #[arg(long, default_value_t = 2003)]
        port: u16,

        /// Default voice to synthesize with
        #[arg(long, default_value = "af_heart")]
        voice: String,

        /// Base URL of the upstream TTS endpoint (no default: spec.md §9
        /// leaves the upstream port unopinionated)
        #[arg(long)]
        kokoro_url: String,

        /// Default playback speed
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
    },

    /// Submit text to a running `serve` process
    Speak {
        /// Text to synthesize and play
        text: String,

        /// Base URL of a running `nayru serve` (e.g. http://127.0.0.1:2003)
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },

    /// Stop playback on a running `serve` process
    Stop {
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },

    /// Skip the current chunk on a running `serve` process
    Skip {
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },

    /// Pause playback on a running `serve` process
    Pause {
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },

    /// Resume playback on a running `serve` process
    Resume {
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },

    /// Print the current status of a running `serve` process
    Status {
        #[arg(long, default_value = nayru_http::DEFAULT_BIND_URL)]
        server: String,
    },
}

/// CLI exit codes (`spec.md` §6): 0 success, 1 upstream unreachable,
/// 2 invalid arguments.
const EXIT_OK: i32 = 0;
const EXIT_UNREACHABLE: i32 = 1;
const EXIT_INVALID_ARGS: i32 = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let code = match cli.mode {
        Mode::Serve {
            port,
            voice,
            kokoro_url,
            speed,
        } => serve(port, voice, kokoro_url, speed),
        Mode::Speak { text, server } => speak(&server, &text),
        Mode::Stop { server } => post_no_body(&server, "/stop"),
        Mode::Skip { server } => post_no_body(&server, "/skip"),
        Mode::Pause { server } => post_no_body(&server, "/pause"),
        Mode::Resume { server } => post_no_body(&server, "/resume"),
        Mode::Status { server } => status(&server),
    };
    std::process::exit(code);
}

fn serve(port: u16, voice: String, kokoro_url: String, speed: f32) -> i32 {
    if !(nayru_engine::config::SPEED_MIN..=nayru_engine::config::SPEED_MAX).contains(&speed) {
        eprintln!(
            "speed {speed} out of range [{}, {}]",
            nayru_engine::config::SPEED_MIN,
            nayru_engine::config::SPEED_MAX
        );
        return EXIT_INVALID_ARGS;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return EXIT_INVALID_ARGS;
        }
    };

    runtime.block_on(async move {
        let config = Config::new(kokoro_url, voice, speed);
        let engine = match Engine::new(config) {
            Ok(engine) => Arc::new(engine),
            Err(err) => {
                eprintln!("failed to start engine: {err}");
                return EXIT_INVALID_ARGS;
            }
        };

        let addr = format!("127.0.0.1:{port}");
        info!(%addr, "serving");
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(err) => {
                eprintln!("failed to bind {addr}: {err}");
                return EXIT_INVALID_ARGS;
            }
        };

        let router = nayru_http::router(engine);
        if let Err(err) = axum::serve(listener, router).await {
            eprintln!("server error: {err}");
            return EXIT_INVALID_ARGS;
        }
        EXIT_OK
    })
}

fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::new()
}

fn speak(server: &str, text: &str) -> i32 {
    if text.trim().is_empty() {
        eprintln!("text must not be empty");
        return EXIT_INVALID_ARGS;
    }
    let body = serde_json::json!({ "text": text });
    match client().post(format!("{server}/speak")).json(&body).send() {
        Ok(response) if response.status().is_success() => EXIT_OK,
        Ok(response) => {
            eprintln!("server returned {}", response.status());
            EXIT_UNREACHABLE
        }
        Err(err) => {
            eprintln!("could not reach {server}: {err}");
            EXIT_UNREACHABLE
        }
    }
}

fn post_no_body(server: &str, path: &str) -> i32 {
    match client().post(format!("{server}{path}")).send() {
        Ok(response) if response.status().is_success() => EXIT_OK,
        Ok(response) => {
            eprintln!("server returned {}", response.status());
            EXIT_UNREACHABLE
        }
        Err(err) => {
            eprintln!("could not reach {server}: {err}");
            EXIT_UNREACHABLE
        }
    }
}

fn status(server: &str) -> i32 {
    match client().get(format!("{server}/status")).send() {
        Ok(response) if response.status().is_success() => match response.json::<Status>() {
            Ok(status) => {
                println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
                EXIT_OK
            }
            Err(err) => {
                eprintln!("malformed status response: {err}");
                EXIT_UNREACHABLE
            }
        },
        Ok(response) => {
            eprintln!("server returned {}", response.status());
            EXIT_UNREACHABLE
        }
        Err(err) => {
            eprintln!("could not reach {server}: {err}");
            EXIT_UNREACHABLE
        }
    }
}

