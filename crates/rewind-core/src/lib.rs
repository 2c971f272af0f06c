//! # rewind-core - Core Domain Types
//!
//! Foundation crate for Rewind. Provides domain types, error handling,
//! target notification definitions, and the debug-target contract.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`, `point`)
//! - [`ExecutionPoint`] - A totally ordered position in the recording
//! - [`Frame`], [`Scope`], [`Location`] - Paused program state
//! - [`SourcePosition`], [`StackFrame`] - Resolved source locations
//! - [`ConsoleMessagePacket`], [`MessageLevel`] - Normalized console events
//!
//! ### Events (`events`)
//! - [`TargetNotification`] - Parsed notifications from the target's
//!   WebSocket connection
//! - [`RawConsoleMessage`] - A console event before location resolution
//!
//! ### Target Contract (`target`)
//! - [`DebugTarget`] - The async operations the session layer consumes
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use rewind_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod point;
pub mod target;
pub mod types;

/// Prelude for common imports used throughout all Rewind crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{
    LogpointHit, NewScript, PointDescription, RawConsoleMessage, RawStackFrame,
    TargetNotification,
};
pub use point::ExecutionPoint;
pub use target::DebugTarget;
pub use types::{
    short_source_name, Binding, ConsoleMessagePacket, Frame, Location, MessageLevel, Scope,
    ScopeKind, SourcePosition, StackFrame,
};
