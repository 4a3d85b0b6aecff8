//! UI client module
//!
//! Presentation-side counterpart of the engine: talks to the daemon over its
//! message boundary, renders elapsed time, books entries and browses the
//! MOCO account.

pub mod catalog;
pub mod commands;
pub mod engine_client;
pub mod submit;
pub mod watcher;

// Re-export main items
pub use catalog::{active_projects, entries_on, format_activity};
pub use commands::run;
pub use engine_client::{EngineClient, TimerSource};
pub use submit::{
    book_activity, daily_advisory, submit_entry, validate, Advisory, Submitted, DAILY_HOURS_LIMIT,
};
pub use watcher::{format_elapsed, Display, ElapsedWatcher};
