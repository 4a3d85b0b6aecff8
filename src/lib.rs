//! MOCO Timer - a persistent work timer that books tracked time to MOCO
//!
//! The daemon owns a single timer, persists it after every change and answers
//! start/stop/query messages over HTTP. The CLI subcommands are its UI client.

pub mod api;
pub mod client;
pub mod config;
pub mod services;
pub mod settings;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, TimerEngine};
pub use utils::signals::shutdown_signal;
