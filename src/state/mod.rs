//! State management module
//!
//! This module contains the timer state, the engine that owns it and the
//! shared application state handed to the HTTP handlers.

pub mod app_state;
pub mod rounding;
pub mod timer_engine;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_engine::{TimerEngine, WeakTimerEngine, TIMER_STATE_KEY};
pub use timer_state::{NewActivity, StartTimer, TimeEntry, TimerSnapshot, TimerState};
