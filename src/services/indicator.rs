//! Visible status indicator (badge text, color and tooltip)

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::state::TimerState;

pub const RUNNING_TEXT: &str = "▶";
pub const RUNNING_COLOR: &str = "#4CAF50";
pub const DEFAULT_TITLE: &str = "MOCO Time Tracker";

/// What the indicator shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    /// `None` leaves the previous background color untouched
    pub color: Option<String>,
    pub title: String,
}

impl Badge {
    /// Badge for a running timer on `project_name`
    pub fn running(project_name: &str) -> Self {
        Self {
            text: RUNNING_TEXT.to_string(),
            color: Some(RUNNING_COLOR.to_string()),
            title: format!("Timer running: {}", project_name),
        }
    }

    pub fn idle() -> Self {
        Self {
            text: String::new(),
            color: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn for_state(state: &TimerState) -> Self {
        if state.is_running {
            Self::running(&state.project_name)
        } else {
            Self::idle()
        }
    }
}

impl Default for Badge {
    fn default() -> Self {
        Self::idle()
    }
}

/// Sink for badge updates.
///
/// Updates are best-effort and idempotent; implementations never fail.
pub trait StatusIndicator: Send + Sync {
    fn show(&self, badge: Badge);
}

/// Publishes the badge on a watch channel so any number of surfaces can read it
#[derive(Debug)]
pub struct WatchIndicator {
    tx: watch::Sender<Badge>,
    /// Keep the receiver alive to prevent channel closure
    _rx: watch::Receiver<Badge>,
}

impl WatchIndicator {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(Badge::idle());
        Self { tx, _rx: rx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Badge> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Badge {
        self.tx.borrow().clone()
    }
}

impl Default for WatchIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator for WatchIndicator {
    fn show(&self, badge: Badge) {
        debug!("Badge update: text={:?}, title={:?}", badge.text, badge.title);
        self.tx.send_modify(|current| {
            current.text = badge.text;
            current.title = badge.title;
            if badge.color.is_some() {
                current.color = badge.color;
            }
        });
    }
}
