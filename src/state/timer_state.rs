//! Timer state structure and the records derived from it

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::rounding::{display_hours, quarter_hours};

/// Payload of a start command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimer {
    pub project_id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub note: String,
}

/// The single process-wide timer, persisted as-is under the `timerState` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    /// Epoch milliseconds
    pub start_time: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub note: String,
}

impl TimerState {
    /// Create the idle state
    pub fn idle() -> Self {
        Self {
            is_running: false,
            start_time: None,
            project_id: None,
            task_id: None,
            project_name: String::new(),
            task_name: String::new(),
            note: String::new(),
        }
    }

    /// Create a running state started at `start_time_ms`
    pub fn running(start_time_ms: i64, start: &StartTimer) -> Self {
        Self {
            is_running: true,
            start_time: Some(start_time_ms),
            project_id: Some(start.project_id),
            task_id: Some(start.task_id),
            project_name: start.project_name.clone(),
            task_name: start.task_name.clone(),
            note: start.note.clone(),
        }
    }

    /// Check the idle/running invariants.
    ///
    /// A record read back from storage that fails this check is not trusted.
    pub fn is_consistent(&self) -> bool {
        if self.is_running {
            self.start_time.is_some() && self.project_id.is_some() && self.task_id.is_some()
        } else {
            self.start_time.is_none()
                && self.project_id.is_none()
                && self.task_id.is_none()
                && self.project_name.is_empty()
                && self.task_name.is_empty()
                && self.note.is_empty()
        }
    }

    /// Milliseconds since start, or `None` when idle.
    ///
    /// Clamped at zero so a clock stepping backwards never yields negative time.
    pub fn elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        match (self.is_running, self.start_time) {
            (true, Some(start)) => Some(now_ms.saturating_sub(start).max(0)),
            _ => None,
        }
    }

    /// Build the read-only snapshot returned by queries
    pub fn snapshot(&self, now_ms: i64) -> TimerSnapshot {
        let elapsed_ms = self.elapsed_ms(now_ms);
        TimerSnapshot {
            state: self.clone(),
            elapsed_hours: elapsed_ms.map(display_hours),
            elapsed_ms,
        }
    }

    /// Build the billable entry for a stop at `now_ms`
    pub fn to_time_entry(&self, now_ms: i64) -> Option<TimeEntry> {
        let elapsed_ms = self.elapsed_ms(now_ms)?;
        Some(TimeEntry {
            project_id: self.project_id?,
            task_id: self.task_id?,
            project_name: self.project_name.clone(),
            task_name: self.task_name.clone(),
            note: self.note.clone(),
            hours: quarter_hours(elapsed_ms),
            start_time: self.start_time?,
        })
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Timer state augmented with live elapsed time while running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    #[serde(flatten)]
    pub state: TimerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
}

impl TimerSnapshot {
    pub fn is_running(&self) -> bool {
        self.state.is_running
    }
}

/// A bare state, without derived fields
impl From<TimerState> for TimerSnapshot {
    fn from(state: TimerState) -> Self {
        Self {
            state,
            elapsed_hours: None,
            elapsed_ms: None,
        }
    }
}

/// Billable record produced when a running timer is stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub project_id: i64,
    pub task_id: i64,
    pub project_name: String,
    pub task_name: String,
    pub note: String,
    pub hours: f64,
    /// Epoch milliseconds of the original start
    pub start_time: i64,
}

impl TimeEntry {
    /// Calendar day (UTC) the entry is booked on
    pub fn date(&self) -> Result<NaiveDate> {
        DateTime::<Utc>::from_timestamp_millis(self.start_time)
            .map(|start| start.date_naive())
            .ok_or_else(|| anyhow!("Start time {} is out of range", self.start_time))
    }

    /// Convert into the activity payload expected by the remote service
    pub fn to_activity(&self) -> Result<NewActivity> {
        Ok(NewActivity {
            date: self.date()?,
            hours: self.hours,
            project_id: self.project_id,
            task_id: self.task_id,
            description: self.note.clone(),
        })
    }
}

/// Activity creation payload of the remote time-tracking service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub hours: f64,
    pub project_id: i64,
    pub task_id: i64,
    pub description: String,
}
