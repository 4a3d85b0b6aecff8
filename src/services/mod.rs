//! External collaborators module
//!
//! The status indicator the engine signals through, and the remote
//! time-tracking service entries are booked on.

pub mod indicator;
pub mod moco;

// Re-export main types
pub use indicator::{Badge, StatusIndicator, WatchIndicator};
pub use moco::{MocoClient, MocoError, TimeTracking};
