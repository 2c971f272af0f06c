//! The contract a remote debug target must satisfy.
//!
//! The session layer is written against this trait so that the
//! WebSocket-backed implementation and test doubles are
//! interchangeable. All calls are issued against the target's current
//! pause; stale results are discarded by the caller, not here.

use serde_json::Value;

use crate::error::Result;
use crate::types::{Frame, Location, Scope};

/// Async operations exposed by a record-and-replay debug target.
///
/// `script_url` and `script_ids_for_url` are synchronous: they consult
/// the local script index built from `Debugger.scriptParsed`
/// notifications, not the wire.
#[trait_variant::make(DebugTarget: Send)]
pub trait LocalDebugTarget {
    /// Fetch the full call-frame list for the current pause.
    async fn fetch_frames(&self) -> Result<Vec<Frame>>;

    /// Fetch the variable scopes of one frame of the current pause.
    async fn fetch_scopes(&self, frame_id: &str) -> Result<Vec<Scope>>;

    /// Map a frame location to its preferred (source-mapped) location.
    async fn preferred_location(&self, raw: &Location) -> Result<Location>;

    /// Map a manually assembled location through available source maps.
    ///
    /// Unlike [`preferred_location`](LocalDebugTarget::preferred_location)
    /// the input was not produced by an execution point, so the mapping
    /// is heuristic.
    async fn preferred_mapped_location(&self, raw: &Location) -> Result<Location>;

    /// Evaluate an expression in the context of a frame.
    async fn evaluate(&self, frame_id: &str, expression: &str) -> Result<Value>;

    /// Remove a breakpoint by id.
    async fn remove_breakpoint(&self, breakpoint_id: &str) -> Result<()>;

    /// Record a script in the url ↔ id index.
    fn record_script(&self, script_id: &str, url: Option<&str>);

    /// URL of a known script id.
    fn script_url(&self, script_id: &str) -> Option<String>;

    /// All script ids a URL resolves to (zero, one, or several).
    fn script_ids_for_url(&self, url: &str) -> Vec<String>;
}
