//! One handler per engine façade method, a 1:1 mapping per `spec.md` §6.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nayru_engine::{Ack, ConfigPatch, EngineError, Status};

use crate::dto::{ErrorBody, SpeakRequest, SpeakResponse};
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorBody>);

fn engine_error_to_response(err: EngineError) -> ApiError {
    let status = match &err {
        EngineError::InvalidInput | EngineError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        EngineError::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    // Routed through `anyhow` at the boundary, matching the split the
    // rest of the workspace uses between typed domain errors and the
    // adapter layer that reports them.
    let err: anyhow::Error = err.into();
    (status, Json(ErrorBody { error: err.to_string() }))
}

pub async fn speak(
    State(state): State<AppState>,
    Json(body): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    if let Some(voice) = body.voice {
        state
            .engine
            .set_config(ConfigPatch {
                voice: Some(voice),
                ..Default::default()
            })
            .map_err(engine_error_to_response)?;
    }

    let ack = state
        .engine
        .speak(&body.text)
        .map_err(engine_error_to_response)?;

    Ok(Json(SpeakResponse {
        ok: true,
        queued_chunks: ack.queued_chunks,
    }))
}

pub async fn stop(State(state): State<AppState>) -> Json<Ack> {
    Json(state.engine.stop())
}

// `spec.md` §4.4 has `skip()` return a full status snapshot for embedders;
// the HTTP table in §6 documents a plain `{ok}` for `/skip` like every
// other transport command, so this handler discards the snapshot.
pub async fn skip(State(state): State<AppState>) -> Json<Ack> {
    state.engine.skip();
    Json(Ack::default())
}

pub async fn pause(State(state): State<AppState>) -> Json<Ack> {
    Json(state.engine.pause())
}

pub async fn resume(State(state): State<AppState>) -> Json<Ack> {
    Json(state.engine.resume())
}

pub async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(state.engine.status())
}
