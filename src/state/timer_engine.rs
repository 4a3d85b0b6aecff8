//! The timer engine: sole owner and writer of the timer state

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    services::indicator::{Badge, StatusIndicator},
    storage::KeyValueStore,
    tasks::badge_refresh_task,
    utils::Clock,
};

use super::{StartTimer, TimeEntry, TimerSnapshot, TimerState};

/// Storage key of the persisted timer record
pub const TIMER_STATE_KEY: &str = "timerState";

struct EngineInner {
    /// Held across the persistence write so mutations never interleave
    /// Badge and ticker updates happen under it too, in mutation order
    state: Mutex<TimerState>,
    store: Arc<dyn KeyValueStore>,
    indicator: Arc<dyn StatusIndicator>,
    clock: Arc<dyn Clock>,
    refresh_period: Duration,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the timer engine. Clones share the same state.
#[derive(Clone)]
pub struct TimerEngine {
    inner: Arc<EngineInner>,
}

/// Non-owning handle held by background tasks
#[derive(Clone)]
pub struct WeakTimerEngine {
    inner: Weak<EngineInner>,
}

impl WeakTimerEngine {
    pub fn upgrade(&self) -> Option<TimerEngine> {
        self.inner.upgrade().map(|inner| TimerEngine { inner })
    }
}

impl TimerEngine {
    /// Load the engine from `store`, falling back to idle when nothing usable
    /// is persisted.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        indicator: Arc<dyn StatusIndicator>,
        clock: Arc<dyn Clock>,
        refresh_period: Duration,
    ) -> Result<Self> {
        let record = store
            .get(TIMER_STATE_KEY)
            .await
            .context("Failed to load timer state")?;

        let state = match record {
            None => {
                debug!("No persisted timer state, starting idle");
                TimerState::idle()
            }
            Some(value) => match serde_json::from_value::<TimerState>(value) {
                Ok(state) if state.is_consistent() => state,
                Ok(state) => {
                    warn!("Persisted timer state is inconsistent, resetting to idle: {:?}", state);
                    TimerState::idle()
                }
                Err(e) => {
                    warn!("Persisted timer state is unreadable, resetting to idle: {}", e);
                    TimerState::idle()
                }
            },
        };

        if state.is_running {
            info!(
                "Restored running timer for project {:?} / task {:?}",
                state.project_id, state.task_id
            );
        }

        let engine = Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(state),
                store,
                indicator,
                clock,
                refresh_period,
                ticker: std::sync::Mutex::new(None),
            }),
        };

        {
            let state = engine.inner.state.lock().await;
            engine.show_badge(&state);
            if state.is_running {
                engine.spawn_ticker();
            }
        }

        Ok(engine)
    }

    pub fn downgrade(&self) -> WeakTimerEngine {
        WeakTimerEngine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Start timing `start`, replacing whatever was running
    pub async fn start(&self, start: StartTimer) -> Result<TimerState> {
        let mut state = self.inner.state.lock().await;

        if state.is_running {
            warn!(
                "Starting a new timer discards the running one for project {:?} / task {:?}",
                state.project_id, state.task_id
            );
        }

        *state = TimerState::running(self.inner.clock.now_ms(), &start);
        let started = state.clone();
        let persisted = self.persist(&started).await;

        // The badge tracks memory even when the write failed
        self.show_badge(&started);
        self.spawn_ticker();
        drop(state);
        persisted?;

        info!(
            "Timer started for project {} / task {}",
            start.project_id, start.task_id
        );
        Ok(started)
    }

    /// Stop the running timer and hand back what it recorded.
    ///
    /// Returns `Ok(None)` without touching storage when nothing is running.
    pub async fn stop(&self) -> Result<Option<TimeEntry>> {
        let mut state = self.inner.state.lock().await;

        let entry = match state.to_time_entry(self.inner.clock.now_ms()) {
            Some(entry) => entry,
            None => {
                debug!("Stop requested while idle");
                return Ok(None);
            }
        };

        *state = TimerState::idle();
        let stopped = state.clone();
        let persisted = self.persist(&stopped).await;

        self.cancel_ticker();
        self.show_badge(&stopped);
        drop(state);
        persisted?;

        info!(
            "Timer stopped for project {} / task {} after {}h",
            entry.project_id, entry.task_id, entry.hours
        );
        Ok(Some(entry))
    }

    /// Current state with live elapsed time
    pub async fn query(&self) -> TimerSnapshot {
        let state = self.inner.state.lock().await;
        state.snapshot(self.inner.clock.now_ms())
    }

    /// Push the badge for the current state. Returns whether the timer runs.
    pub async fn refresh_indicator(&self) -> bool {
        let state = self.inner.state.lock().await;
        self.show_badge(&state);
        state.is_running
    }

    /// Stop background work owned by the engine
    pub fn shutdown(&self) {
        self.cancel_ticker();
        debug!("Timer engine shut down");
    }

    async fn persist(&self, state: &TimerState) -> Result<()> {
        let value = serde_json::to_value(state)?;
        self.inner
            .store
            .set(TIMER_STATE_KEY, value)
            .await
            .context("Failed to persist timer state")
    }

    fn show_badge(&self, state: &TimerState) {
        self.inner.indicator.show(Badge::for_state(state));
    }

    fn spawn_ticker(&self) {
        let Ok(mut ticker) = self.inner.ticker.lock() else {
            warn!("Badge ticker lock poisoned, periodic refresh disabled");
            return;
        };
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let handle = tokio::spawn(badge_refresh_task(self.downgrade(), self.inner.refresh_period));
        *ticker = Some(handle);
    }

    fn cancel_ticker(&self) {
        if let Ok(mut ticker) = self.inner.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }

    #[cfg(test)]
    fn ticker_active(&self) -> bool {
        self.inner
            .ticker
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}
