//! # rewind-session - Pause Orchestration & Message Ingestion
//!
//! The session layer of Rewind: everything between the raw target
//! connection and the consumer.
//!
//! - [`PauseCoordinator`] reacts to `paused` notifications with a fixed,
//!   partially-ordered hydration sequence; the latest pause always wins.
//! - [`ConsolePipeline`] turns the unbounded console notification stream
//!   into coalesced, time-windowed batches.
//! - [`resolver`] maps raw locations to preferred (source-mapped)
//!   positions, best-effort.
//! - [`ConsoleStore`] is the consumer-side message model: ordered,
//!   bounded, logpoint-aware.
//! - [`DebugSession`] wires the pieces to a
//!   [`DebugTarget`](rewind_core::target::DebugTarget) and hands
//!   consumers one typed [`SessionEvent`] channel.

pub mod breakpoints;
pub mod console;
pub mod context;
pub mod events;
pub mod expressions;
pub mod pause;
pub mod resolver;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use breakpoints::{Breakpoint, BreakpointStore};
pub use console::{ConsoleCommand, ConsolePipeline, LogpointTracker, PendingQueue, FLUSH_INTERVAL};
pub use context::{PauseId, PauseTracker, ThreadContext};
pub use events::SessionEvent;
pub use expressions::{WatchExpression, WatchResult, WatchState, WatchStore};
pub use pause::{PauseCoordinator, PauseState};
pub use session::DebugSession;
pub use store::ConsoleStore;
