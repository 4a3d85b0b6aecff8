//! Main application state shared by the HTTP handlers

use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::services::indicator::{Badge, WatchIndicator};

use super::TimerEngine;

/// Everything the handlers need: the engine plus server metadata
pub struct AppState {
    /// The timer engine, sole writer of the timer state
    pub engine: TimerEngine,
    /// Badge published by the engine
    pub indicator: Arc<WatchIndicator>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last message action handled
    last_action: std::sync::Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create a new AppState around a loaded engine
    pub fn new(engine: TimerEngine, indicator: Arc<WatchIndicator>, port: u16, host: String) -> Self {
        Self {
            engine,
            indicator,
            start_time: Instant::now(),
            port,
            host,
            last_action: std::sync::Mutex::new(None),
        }
    }

    /// Current badge
    pub fn badge(&self) -> Badge {
        self.indicator.current()
    }

    /// Remember the last handled action
    pub fn record_action(&self, action: &str) {
        match self.last_action.lock() {
            Ok(mut last) => *last = Some((action.to_string(), Utc::now())),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, time)) => (Some(action), Some(time)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed().as_secs())
    }
}

fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
