//! Live elapsed-time display for a running timer

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time};
use tracing::{debug, warn};

use super::engine_client::TimerSource;

/// What the display shows on each refresh
#[derive(Debug, Clone, PartialEq)]
pub enum Display {
    /// Waiting for the first answer
    Pending,
    Running {
        elapsed: String,
        project_name: String,
        task_name: String,
    },
    Idle,
}

/// `HH:MM:SS`, hours not capped at 24
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let total_secs = elapsed_ms.max(0) / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

/// Periodic refresh of the elapsed display.
///
/// The refresh task ends on its own once the timer is seen idle, and is
/// aborted by `cancel` or when the watcher is dropped.
pub struct ElapsedWatcher {
    handle: JoinHandle<()>,
    rx: watch::Receiver<Display>,
}

impl ElapsedWatcher {
    pub fn spawn(source: Arc<dyn TimerSource>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(Display::Pending);
        let handle = tokio::spawn(refresh_loop(source, period, tx));
        Self { handle, rx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Display> {
        self.rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ElapsedWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn refresh_loop(source: Arc<dyn TimerSource>, period: Duration, tx: watch::Sender<Display>) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let snapshot = match source.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Keep the last display; the next tick retries
                warn!("Failed to refresh timer display: {:#}", e);
                continue;
            }
        };

        if !snapshot.state.is_running {
            debug!("Timer idle, ending display refresh");
            let _ = tx.send(Display::Idle);
            break;
        }

        let display = Display::Running {
            elapsed: format_elapsed(snapshot.elapsed_ms.unwrap_or_default()),
            project_name: snapshot.state.project_name,
            task_name: snapshot.state.task_name,
        };
        if tx.send(display).is_err() {
            debug!("No display listening, ending display refresh");
            break;
        }
    }
}
