//! Periodic badge refresh while a timer runs

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::state::WeakTimerEngine;

/// Refresh the status indicator every `period` until the timer stops or the
/// engine is dropped.
///
/// The engine aborts this task on stop and on shutdown; the exit checks below
/// only cover a stop that raced with a tick.
pub async fn badge_refresh_task(engine: WeakTimerEngine, period: Duration) {
    debug!("Starting badge refresh task every {:?}", period);

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the badge was just drawn
    interval.tick().await;

    loop {
        interval.tick().await;

        let Some(engine) = engine.upgrade() else {
            debug!("Timer engine dropped, ending badge refresh task");
            break;
        };

        if !engine.refresh_indicator().await {
            debug!("Timer no longer running, ending badge refresh task");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        services::indicator::{Badge, StatusIndicator, WatchIndicator},
        state::{StartTimer, TimerEngine},
        storage::MemoryStore,
        utils::ManualClock,
    };

    #[tokio::test(start_paused = true)]
    async fn ticks_redraw_the_running_badge() {
        let indicator = Arc::new(WatchIndicator::new());
        let engine = TimerEngine::load(
            Arc::new(MemoryStore::new()),
            indicator.clone(),
            Arc::new(ManualClock::new(0)),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        engine
            .start(StartTimer {
                project_id: 1,
                task_id: 2,
                project_name: "Website".to_string(),
                task_name: "Design".to_string(),
                note: String::new(),
            })
            .await
            .unwrap();

        // Scribble over the badge; the next tick must restore it
        indicator.show(Badge::idle());
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(indicator.current(), Badge::running("Website"));

        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn task_ends_once_the_engine_is_gone() {
        let engine = TimerEngine::load(
            Arc::new(MemoryStore::new()),
            Arc::new(WatchIndicator::new()),
            Arc::new(ManualClock::new(0)),
            Duration::from_secs(60),
        )
        .await
        .unwrap();
        let weak = engine.downgrade();
        drop(engine);

        let handle = tokio::spawn(badge_refresh_task(weak, Duration::from_secs(1)));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
