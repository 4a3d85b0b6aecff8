//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod badge_refresh;

// Re-export main functions
pub use badge_refresh::badge_refresh_task;
