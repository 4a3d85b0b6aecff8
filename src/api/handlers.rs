//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Json};
use tracing::debug;

use crate::{services::indicator::Badge, state::AppState};

use super::{
    messages::{dispatch, Message},
    responses::{HealthResponse, MessageResponse, StatusResponse},
};

/// Handle POST /message - run one command or query against the engine.
///
/// Always answers 200; failures are carried in the body.
pub async fn message_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Json<MessageResponse> {
    let message = match Message::decode(&body) {
        Ok(message) => message,
        Err(response) => return Json(response),
    };

    debug!("Handling message: {}", message.action());
    state.record_action(message.action());

    Json(dispatch(&state.engine, message).await)
}

/// Handle GET /badge - current status indicator
pub async fn badge_handler(State(state): State<Arc<AppState>>) -> Json<Badge> {
    Json(state.badge())
}

/// Handle GET /status - timer snapshot plus server information
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.engine.query().await,
        badge: state.badge(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
