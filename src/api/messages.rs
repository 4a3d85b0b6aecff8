//! Command/query messages accepted by the timer engine

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::state::{StartTimer, TimerEngine};

use super::responses::MessageResponse;

pub const UNKNOWN_ACTION: &str = "Unknown action";

/// A message from a UI surface, tagged by its `action` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    StartTimer(StartTimer),
    StopTimer,
    GetTimerState,
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::StartTimer(_) => "startTimer",
            Message::StopTimer => "stopTimer",
            Message::GetTimerState => "getTimerState",
            Message::Unknown => "unknown",
        }
    }

    /// Decode a raw message body, turning any decoding problem into a failure
    /// response rather than an error.
    pub fn decode(body: &[u8]) -> Result<Self, MessageResponse> {
        serde_json::from_slice(body).map_err(|e| {
            warn!("Rejected malformed message: {}", e);
            MessageResponse::failure(format!("Invalid message: {}", e))
        })
    }
}

/// Run one message against the engine. Never fails; errors become failure
/// responses.
pub async fn dispatch(engine: &TimerEngine, message: Message) -> MessageResponse {
    match message {
        Message::StartTimer(start) => match engine.start(start).await {
            Ok(state) => MessageResponse::state(state.into()),
            Err(e) => {
                error!("Failed to start timer: {:#}", e);
                MessageResponse::failure(format!("{:#}", e))
            }
        },
        Message::StopTimer => match engine.stop().await {
            Ok(result) => MessageResponse::stopped(result),
            Err(e) => {
                error!("Failed to stop timer: {:#}", e);
                MessageResponse::failure(format!("{:#}", e))
            }
        },
        Message::GetTimerState => MessageResponse::state(engine.query().await),
        Message::Unknown => MessageResponse::failure(UNKNOWN_ACTION.to_string()),
    }
}
