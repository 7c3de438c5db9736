//! Thin axum adapter over [`nayru_engine::Engine`] (`spec.md` §6).
//! One handler per façade method; no engine logic lives here.

mod dto;
mod handlers;

pub use dto::{ErrorBody, SpeakRequest, SpeakResponse};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use nayru_engine::Engine;
use tower_http::cors::CorsLayer;

/// `spec.md` §6: "default bind `127.0.0.1:2003`".
pub const DEFAULT_BIND: &str = "127.0.0.1:2003";

/// The same default, as a URL thin clients (`nayru-cli`) can POST against.
pub const DEFAULT_BIND_URL: &str = "http://127.0.0.1:2003";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// Builds the router with permissive CORS (`spec.md` §6).
pub fn router(engine: Arc<Engine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/speak", post(handlers::speak))
        .route("/stop", post(handlers::stop))
        .route("/skip", post(handlers::skip))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/status", get(handlers::status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nayru_engine::{Config, Engine};
    use tower::ServiceExt;

    fn test_engine() -> Arc<Engine> {
        Arc::new(
            Engine::with_sink(
                Config::new("http://127.0.0.1:1", "af_heart", 1.0),
                |_| Ok(Box::new(nayru_engine::sink::FakeSink::default())),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn status_returns_idle_on_a_fresh_engine() {
        let app = router(test_engine());
        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn speak_rejects_empty_text() {
        let app = router(test_engine());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/speak")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
