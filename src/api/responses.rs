//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::indicator::Badge,
    state::{TimeEntry, TimerSnapshot},
};

/// Reply to a message.
///
/// Untagged so the JSON is exactly `{success, state}`, `{success, result}` or
/// `{success, error}`. `Failure` comes first so decoding picks it whenever an
/// `error` field is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    Failure { success: bool, error: String },
    State { success: bool, state: TimerSnapshot },
    Stopped { success: bool, result: Option<TimeEntry> },
}

impl MessageResponse {
    /// Successful start or query
    pub fn state(state: TimerSnapshot) -> Self {
        Self::State {
            success: true,
            state,
        }
    }

    /// Successful stop; `None` when nothing was running
    pub fn stopped(result: Option<TimeEntry>) -> Self {
        Self::Stopped {
            success: true,
            result,
        }
    }

    pub fn failure(error: String) -> Self {
        Self::Failure {
            success: false,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Self::Failure { success, .. }
            | Self::State { success, .. }
            | Self::Stopped { success, .. } => *success,
        }
    }
}

/// Status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub badge: Badge,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::TimerState;

    #[test]
    fn stop_on_idle_serializes_an_explicit_null() {
        let value = serde_json::to_value(MessageResponse::stopped(None)).unwrap();
        assert_eq!(value, json!({ "success": true, "result": null }));
    }

    #[test]
    fn responses_decode_into_the_right_shape() {
        let failure: MessageResponse =
            serde_json::from_value(json!({ "success": false, "error": "Unknown action" })).unwrap();
        assert_eq!(failure, MessageResponse::failure("Unknown action".to_string()));

        let stopped: MessageResponse =
            serde_json::from_value(json!({ "success": true, "result": null })).unwrap();
        assert_eq!(stopped, MessageResponse::stopped(None));

        let state: MessageResponse = serde_json::from_value(
            serde_json::to_value(MessageResponse::state(TimerState::idle().into())).unwrap(),
        )
        .unwrap();
        assert_eq!(state, MessageResponse::state(TimerState::idle().into()));
    }
}
