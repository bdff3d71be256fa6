//! HTTP surface
//!
//! - `POST /api/try`: `{"name": "...", "number": "..."}` → `{"message": "..."}`
//! - `GET /health`: liveness
//!
//! Status mapping lives here and nowhere else:
//!
//! | Result | Status |
//! |---|---|
//! | AlreadyPlayed, Win, Lose | 200 |
//! | InvalidInput outcome, empty name, malformed body | 400 |
//! | Store or generator failure | 500 |

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bingo_core::{Error, GuessEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Message returned for every server-side failure
const INTERNAL_ERROR_MESSAGE: &str = "Oops something wrong happened...";

/// Shared state of all request handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GuessEngine>,
}

/// Body of `POST /api/try`
#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    pub name: String,
    pub number: GuessValue,
}

/// The guess may arrive as a JSON string or a JSON integer
///
/// Any other JSON value is kept verbatim so it is reported as not a number
/// instead of failing deserialization.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GuessValue {
    Integer(i64),
    Text(String),
    Other(serde_json::Value),
}

impl GuessValue {
    fn as_text(&self) -> String {
        match self {
            GuessValue::Integer(n) => n.to_string(),
            GuessValue::Text(s) => s.clone(),
            GuessValue::Other(value) => value.to_string(),
        }
    }
}

/// Body of every `/api/try` response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn reply(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                message: message.into(),
            }),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/try", post(try_luck))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn try_luck(
    State(state): State<AppState>,
    payload: Result<Json<GuessRequest>, JsonRejection>,
) -> (StatusCode, Json<MessageResponse>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), status = 400, "malformed guess request");
            return MessageResponse::reply(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let guess = request.number.as_text();
    match state.engine.evaluate(&request.name, &guess).await {
        Ok(evaluation) => {
            let status = if evaluation.outcome.is_success() {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            info!(
                user = %request.name,
                number = %guess,
                outcome = ?evaluation.outcome,
                status = status.as_u16(),
                "{}",
                evaluation.message
            );
            MessageResponse::reply(status, evaluation.message)
        }
        Err(e) if e.is_client_error() => {
            warn!(user = %request.name, number = %guess, error = %e, status = 400, "rejected guess");
            MessageResponse::reply(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            log_server_error(&request.name, &guess, &e);
            MessageResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

fn log_server_error(user: &str, guess: &str, e: &Error) {
    match e {
        Error::GeneratorUnreachable(_) | Error::GeneratorResponseInvalid(_) => error!(
            user,
            number = guess,
            kind = e.kind(),
            error = %e,
            status = 500,
            "number generator failed"
        ),
        _ => error!(
            user,
            number = guess,
            kind = e.kind(),
            error = %e,
            status = 500,
            "store failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use bingo_core::{BingoConfig, KvStore, MemoryStore, NumberGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct Fixed {
        value: Option<i64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NumberGenerator for Fixed {
        async fn generate(&self) -> bingo_core::Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value
                .ok_or_else(|| Error::generator_unreachable("connection refused"))
        }

        fn generator_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn app(store: &MemoryStore, value: Option<i64>) -> (Router, Arc<Fixed>) {
        let generator = Arc::new(Fixed {
            value,
            calls: AtomicUsize::new(0),
        });
        let engine = GuessEngine::from_config(
            Arc::new(store.clone()),
            generator.clone(),
            &BingoConfig::default(),
        )
        .unwrap();
        let state = AppState {
            engine: Arc::new(engine),
        };
        (build_router(state), generator)
    }

    async fn post_guess(router: Router, body: &str) -> (StatusCode, MessageResponse) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/try")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let message = serde_json::from_slice(&bytes).unwrap_or(MessageResponse {
            message: String::from_utf8_lossy(&bytes).into_owned(),
        });
        (status, message)
    }

    #[tokio::test]
    async fn test_win_then_already_played() {
        let store = MemoryStore::new();
        let (router, _) = app(&store, Some(7));

        let (status, body) = post_guess(router.clone(), r#"{"name":"alice","number":"7"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.message,
            "hooray alice, great job you guess the correct number!"
        );

        let (status, body) = post_guess(router, r#"{"name":"alice","number":"7"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "hey alice, you already tried your luck today");
    }

    #[tokio::test]
    async fn test_lose_with_integer_guess() {
        let store = MemoryStore::new();
        let (router, _) = app(&store, Some(7));

        let (status, body) = post_guess(router, r#"{"name":"bob","number":8}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.message.starts_with("sorry bob, you didn't guess"));
    }

    #[tokio::test]
    async fn test_invalid_guess_is_client_error() {
        let store = MemoryStore::new();
        let (router, generator) = app(&store, Some(7));

        let (status, body) = post_guess(router, r#"{"name":"carol","number":"abc"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("carol"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(!store.exists("player:carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_integer_json_guesses_get_invalid_input_reply() {
        let store = MemoryStore::new();
        let (router, generator) = app(&store, Some(7));

        let (status, body) = post_guess(router.clone(), r#"{"name":"frank","number":7.5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, r#"sorry frank, "7.5" is not a number"#);

        let (status, body) = post_guess(
            router.clone(),
            r#"{"name":"frank","number":99999999999999999999}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.starts_with("sorry frank, \""));
        assert!(body.message.ends_with("\" is not a number"));

        let (status, body) = post_guess(router, r#"{"name":"frank","number":null}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, r#"sorry frank, "null" is not a number"#);

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(!store.exists("player:frank").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_name_and_malformed_body_are_client_errors() {
        let store = MemoryStore::new();
        let (router, _) = app(&store, Some(7));

        let (status, _) = post_guess(router.clone(), r#"{"name":"","number":"7"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_guess(router, r#"{"name":"dave"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generator_failure_is_internal_error() {
        let store = MemoryStore::new();
        let (router, _) = app(&store, None);

        let (status, body) = post_guess(router, r#"{"name":"erin","number":"7"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
        assert!(!store.exists("player:erin").await.unwrap());
    }

    #[tokio::test]
    async fn test_health() {
        let store = MemoryStore::new();
        let (router, _) = app(&store, Some(7));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
