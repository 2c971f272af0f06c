//! Rewind - terminal front-end for record-and-replay debug targets
//!
//! The binary attaches to a target over WebSocket and follows its
//! console output and pauses headlessly. All session logic lives in the
//! workspace crates; this crate only holds the follower loop and the
//! settings file.

pub mod config;
pub mod follow;

pub use config::Settings;
pub use follow::run_follow;
