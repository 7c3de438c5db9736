//! Request/response bodies for `spec.md` §6's HTTP API table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub ok: bool,
    pub queued_chunks: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
