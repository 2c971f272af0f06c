//! Events delivered to session consumers.
//!
//! Components never call into consumers directly; they send typed
//! events over an unbounded channel handed out by
//! [`DebugSession::new`](crate::session::DebugSession::new).

use rewind_core::{ConsoleMessagePacket, Frame, Scope, SourcePosition};

use crate::context::ThreadContext;
use crate::expressions::WatchResult;

/// All events the session layer publishes.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // ─────────────────────────────────────────────────────────
    // Pause Hydration
    // ─────────────────────────────────────────────────────────
    /// Watch expressions are being re-evaluated; stale values should be
    /// shown as loading.
    WatchesLoading { context: ThreadContext },

    /// The previously selected frame survived this pause; re-select its
    /// location. `remap` asks the consumer to translate the position if
    /// underlying sources were reloaded.
    SelectLocation {
        context: ThreadContext,
        location: SourcePosition,
        remap: bool,
    },

    /// Resolved source positions for every frame, in frame order.
    FramePositions {
        context: ThreadContext,
        positions: Vec<SourcePosition>,
    },

    /// Variable scopes for the selected frame.
    ScopesLoaded {
        context: ThreadContext,
        frame_id: String,
        scopes: Vec<Scope>,
    },

    /// Watch expression results, one per pinned expression.
    WatchResults {
        context: ThreadContext,
        results: Vec<WatchResult>,
    },

    /// Hydration finished; this is the consistent pause snapshot.
    PauseHydrated {
        context: ThreadContext,
        frames: Vec<Frame>,
        selected: Option<SourcePosition>,
    },

    /// Frame fetch failed; no pause state will be published for this
    /// generation.
    PauseFailed {
        context: ThreadContext,
        error: String,
    },

    // ─────────────────────────────────────────────────────────
    // Console Messages
    // ─────────────────────────────────────────────────────────
    /// One coalesced batch of console packets, in arrival order.
    MessageBatch(Vec<ConsoleMessagePacket>),

    /// All messages were cleared, including any not yet delivered.
    MessagesCleared,

    /// All packets of one logpoint group were removed.
    LogpointCleared { log_group_id: String },
}

impl SessionEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::WatchesLoading { .. } => "watchesLoading",
            SessionEvent::SelectLocation { .. } => "selectLocation",
            SessionEvent::FramePositions { .. } => "framePositions",
            SessionEvent::ScopesLoaded { .. } => "scopesLoaded",
            SessionEvent::WatchResults { .. } => "watchResults",
            SessionEvent::PauseHydrated { .. } => "pauseHydrated",
            SessionEvent::PauseFailed { .. } => "pauseFailed",
            SessionEvent::MessageBatch(_) => "messageBatch",
            SessionEvent::MessagesCleared => "messagesCleared",
            SessionEvent::LogpointCleared { .. } => "logpointCleared",
        }
    }
}
