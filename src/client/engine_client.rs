//! HTTP client for the engine's message boundary

use anyhow::{anyhow, Context, Result};
use futures::{future::BoxFuture, FutureExt};
use tracing::debug;

use crate::{
    api::{messages::Message, responses::MessageResponse},
    services::Badge,
    state::{StartTimer, TimeEntry, TimerEngine, TimerSnapshot},
};

/// Anything that can report the current timer snapshot
pub trait TimerSource: Send + Sync {
    fn snapshot(&self) -> BoxFuture<'_, Result<TimerSnapshot>>;
}

impl TimerSource for TimerEngine {
    fn snapshot(&self) -> BoxFuture<'_, Result<TimerSnapshot>> {
        async move { Ok(self.query().await) }.boxed()
    }
}

/// Talks to a running daemon
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: reqwest::Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // The daemon is local; never route it through a proxy
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, message: &Message) -> Result<MessageResponse> {
        debug!("Sending {} to {}", message.action(), self.base_url);
        let response = self
            .client
            .post(format!("{}/message", self.base_url))
            .json(message)
            .send()
            .await
            .with_context(|| format!("Could not reach the timer daemon at {}", self.base_url))?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn start(&self, start: StartTimer) -> Result<TimerSnapshot> {
        match self.send(&Message::StartTimer(start)).await? {
            MessageResponse::State { state, .. } => Ok(state),
            other => Err(unexpected(other)),
        }
    }

    /// Stop the timer; `None` when nothing was running
    pub async fn stop(&self) -> Result<Option<TimeEntry>> {
        match self.send(&Message::StopTimer).await? {
            MessageResponse::Stopped { result, .. } => Ok(result),
            other => Err(unexpected(other)),
        }
    }

    pub async fn query(&self) -> Result<TimerSnapshot> {
        match self.send(&Message::GetTimerState).await? {
            MessageResponse::State { state, .. } => Ok(state),
            other => Err(unexpected(other)),
        }
    }

    pub async fn badge(&self) -> Result<Badge> {
        let response = self
            .client
            .get(format!("{}/badge", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl TimerSource for EngineClient {
    fn snapshot(&self) -> BoxFuture<'_, Result<TimerSnapshot>> {
        self.query().boxed()
    }
}

fn unexpected(response: MessageResponse) -> anyhow::Error {
    match response {
        MessageResponse::Failure { error, .. } => anyhow!(error),
        other => anyhow!("Unexpected response from timer daemon: {:?}", other),
    }
}
