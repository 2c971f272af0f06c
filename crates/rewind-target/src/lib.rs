//! # rewind-target - Debug Target Transport
//!
//! WebSocket JSON-RPC client for remote record-and-replay debug targets.
//!
//! - [`TargetClient`] owns the connection: a background task reads the
//!   socket, correlates responses via [`protocol::RequestTracker`], and
//!   forwards typed notifications.
//! - [`TargetSession`] layers typed operations (frames, scopes,
//!   locations, evaluation) over a [`RequestHandle`] and maintains the
//!   url ↔ script-id index; it implements
//!   [`rewind_core::target::DebugTarget`].

pub mod client;
pub mod protocol;
pub mod session;

pub use client::{ClientEvent, ConnectionState, RequestHandle, TargetClient};
pub use protocol::{parse_target_message, RequestTracker, TargetMessage, TargetRequest};
pub use session::{ScriptIndex, TargetSession};
