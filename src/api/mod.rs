//! HTTP API module
//!
//! The engine's message boundary plus read-only status endpoints.

pub mod handlers;
pub mod messages;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/badge", get(badge_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        services::indicator::WatchIndicator,
        state::TimerEngine,
        storage::MemoryStore,
        utils::ManualClock,
    };

    async fn app(clock: ManualClock) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let indicator = Arc::new(WatchIndicator::new());
        let engine = TimerEngine::load(
            store.clone(),
            indicator.clone(),
            Arc::new(clock),
            Duration::from_secs(60),
        )
        .await
        .unwrap();
        let state = Arc::new(AppState::new(engine, indicator, 0, "127.0.0.1".to_string()));
        (create_router(state), store)
    }

    async fn send(router: &Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/message")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(router: &Router, uri: &str) -> Value {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn start_query_stop_round_trip() {
        let clock = ManualClock::new(1_000_000);
        let (router, _store) = app(clock.clone()).await;

        let (status, started) = send(
            &router,
            json!({
                "action": "startTimer",
                "projectId": 1,
                "taskId": 2,
                "projectName": "Website",
                "taskName": "Design",
                "note": "kickoff"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["success"], json!(true));
        assert_eq!(started["state"]["isRunning"], json!(true));
        assert_eq!(started["state"]["startTime"], json!(1_000_000));
        assert!(started["state"].get("elapsedMs").is_none());

        clock.advance(5_400_000);
        let (_, queried) = send(&router, json!({ "action": "getTimerState" })).await;
        assert_eq!(queried["state"]["elapsedMs"], json!(5_400_000));
        assert_eq!(queried["state"]["elapsedHours"], json!(1.5));

        let (_, stopped) = send(&router, json!({ "action": "stopTimer" })).await;
        assert_eq!(stopped["success"], json!(true));
        assert_eq!(stopped["result"]["projectId"], json!(1));
        assert_eq!(stopped["result"]["taskId"], json!(2));
        assert_eq!(stopped["result"]["hours"], json!(1.5));
        assert_eq!(stopped["result"]["note"], json!("kickoff"));

        let (_, idle) = send(&router, json!({ "action": "getTimerState" })).await;
        assert_eq!(idle["state"]["isRunning"], json!(false));
    }

    #[tokio::test]
    async fn stop_while_idle_returns_null_result() {
        let (router, _store) = app(ManualClock::new(0)).await;
        let (_, stopped) = send(&router, json!({ "action": "stopTimer" })).await;
        assert_eq!(stopped, json!({ "success": true, "result": null }));
    }

    #[tokio::test]
    async fn unknown_action_is_a_structured_failure() {
        let (router, _store) = app(ManualClock::new(0)).await;
        let (status, response) = send(&router, json!({ "action": "pauseTimer" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, json!({ "success": false, "error": "Unknown action" }));
    }

    #[tokio::test]
    async fn storage_failure_is_a_structured_failure() {
        let (router, store) = app(ManualClock::new(0)).await;
        store.set_fail_writes(true);

        let (status, response) = send(
            &router,
            json!({ "action": "startTimer", "projectId": 1, "taskId": 2 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["success"], json!(false));
        assert!(response["error"]
            .as_str()
            .unwrap()
            .contains("Failed to persist timer state"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_structured_failure() {
        let (router, _store) = app(ManualClock::new(0)).await;
        let request = Request::builder()
            .method("POST")
            .uri("/message")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], json!(false));
    }

    #[tokio::test]
    async fn badge_and_status_reflect_the_timer() {
        let (router, _store) = app(ManualClock::new(0)).await;
        send(
            &router,
            json!({ "action": "startTimer", "projectId": 1, "taskId": 2, "projectName": "Website" }),
        )
        .await;

        let badge = get_json(&router, "/badge").await;
        assert_eq!(badge["text"], json!("▶"));
        assert_eq!(badge["title"], json!("Timer running: Website"));

        let status = get_json(&router, "/status").await;
        assert_eq!(status["timer"]["isRunning"], json!(true));
        assert_eq!(status["last_action"], json!("startTimer"));

        let health = get_json(&router, "/health").await;
        assert_eq!(health["status"], json!("ok"));
    }
}
