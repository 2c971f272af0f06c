//! Pause orchestration.
//!
//! Turns one `paused` notification into a fully hydrated, consistent
//! pause snapshot. The latest pause always wins: a new pause bumps the
//! generation synchronously, and every async continuation of an older
//! hydration checks its context before publishing — superseded results
//! are discarded silently.

use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use tokio::sync::mpsc;

use rewind_core::prelude::*;
use rewind_core::target::DebugTarget;
use rewind_core::{ExecutionPoint, Frame, SourcePosition};

use crate::breakpoints::BreakpointStore;
use crate::context::{PauseTracker, ThreadContext};
use crate::events::SessionEvent;
use crate::expressions::{WatchResult, WatchState, WatchStore};
use crate::resolver::{resolve_frame_position, resolve_frame_positions};

/// Hydration state of the coordinator.
///
/// Re-entered on every pause; `Pausing` with an empty frame list is the
/// failure state after a frame fetch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Idle,
    Pausing,
    Hydrated,
}

/// Reacts to pause notifications by fetching and ordering dependent
/// debug state.
pub struct PauseCoordinator<T> {
    target: Arc<T>,
    tracker: PauseTracker,
    state: Mutex<PauseState>,
    /// Frame id selected in the previous pause, if any. Used to keep the
    /// selection stable across pauses when the frame identity survives.
    selected_frame: Mutex<Option<String>>,
    breakpoints: Arc<BreakpointStore>,
    watches: Arc<WatchStore>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<T> PauseCoordinator<T>
where
    T: DebugTarget + Send + Sync + 'static,
{
    pub fn new(
        target: Arc<T>,
        thread: impl Into<String>,
        breakpoints: Arc<BreakpointStore>,
        watches: Arc<WatchStore>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            target,
            tracker: PauseTracker::new(thread),
            state: Mutex::new(PauseState::Idle),
            selected_frame: Mutex::new(None),
            breakpoints,
            watches,
            events,
        }
    }

    /// React to a pause notification.
    ///
    /// Bumps the pause generation immediately — superseding any
    /// in-flight hydration — and runs hydration as a background task.
    /// Returns the context of the new pause.
    pub fn on_paused(self: &Arc<Self>, point: ExecutionPoint) -> ThreadContext {
        let cx = self.tracker.new_pause();
        *self.lock_state() = PauseState::Pausing;
        debug!("paused at point {} (generation {})", point.point, cx.pause);

        let coordinator = Arc::clone(self);
        let task_cx = cx.clone();
        tokio::spawn(async move {
            coordinator.hydrate(task_cx, point).await;
        });

        cx
    }

    /// Whether `cx` still belongs to the most recent pause.
    pub fn is_current(&self, cx: &ThreadContext) -> bool {
        self.tracker.is_current(cx)
    }

    pub fn state(&self) -> PauseState {
        *self.lock_state()
    }

    /// Frame the current pause considers selected.
    pub fn selected_frame_id(&self) -> Option<String> {
        self.selected_frame
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn hydrate(&self, cx: ThreadContext, point: ExecutionPoint) {
        // Stale watch values must not be shown while re-evaluation is
        // pending.
        if self.watches.mark_all_loading() {
            self.send(SessionEvent::WatchesLoading {
                context: cx.clone(),
            });
        }

        // The frame list is a hard prerequisite for everything after it.
        let frames = match self.target.fetch_frames().await {
            Ok(frames) => frames,
            Err(err) => {
                if self.tracker.is_current(&cx) {
                    warn!("frame fetch failed for pause {}: {}", point.point, err);
                    self.send(SessionEvent::PauseFailed {
                        context: cx,
                        error: err.to_string(),
                    });
                }
                return;
            }
        };
        if !self.tracker.is_current(&cx) {
            return;
        }

        // Keep the selection stable when the previously selected frame
        // survived this pause; otherwise fall back to the top frame.
        let previous = self.selected_frame_id();
        let surviving = previous
            .as_deref()
            .and_then(|id| frames.iter().find(|f| f.frame_id == id))
            .cloned();
        let selected = surviving.clone().or_else(|| frames.first().cloned());

        {
            let mut selected_frame = self
                .selected_frame
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *selected_frame = selected.as_ref().map(|f| f.frame_id.clone());
        }

        if let Some(frame) = &surviving {
            let location = resolve_frame_position(&*self.target, &frame.location).await;
            if !self.tracker.is_current(&cx) {
                return;
            }
            self.send(SessionEvent::SelectLocation {
                context: cx.clone(),
                location,
                remap: true,
            });
        }

        // Hidden breakpoints back one-shot stepping and must not
        // outlive the pause that hit them. Removal is best-effort: the
        // target may have raced us and dropped it already.
        if let Some(hidden) = self.breakpoints.hidden_breakpoint() {
            if let Err(err) = self.target.remove_breakpoint(&hidden.id).await {
                debug!("hidden breakpoint {} already removed: {}", hidden.id, err);
            }
            self.breakpoints.remove(&hidden.id);
            if !self.tracker.is_current(&cx) {
                return;
            }
        }

        // Frame positions and scopes+watches share no state and run
        // concurrently; watches wait on scopes because expression
        // evaluation may rely on scope-derived local-variable mappings.
        let (positions, _) = tokio::join!(
            self.publish_frame_positions(&cx, &frames),
            self.publish_scopes_and_watches(&cx, selected.as_ref()),
        );

        if !self.tracker.is_current(&cx) {
            return;
        }

        let selected_position = selected.as_ref().and_then(|frame| {
            let index = frames.iter().position(|f| f.frame_id == frame.frame_id)?;
            positions.as_ref()?.get(index).cloned()
        });

        *self.lock_state() = PauseState::Hydrated;
        self.send(SessionEvent::PauseHydrated {
            context: cx,
            frames,
            selected: selected_position,
        });
    }

    /// Branch A: per-frame source position annotations.
    async fn publish_frame_positions(
        &self,
        cx: &ThreadContext,
        frames: &[Frame],
    ) -> Option<Vec<SourcePosition>> {
        let positions = resolve_frame_positions(&*self.target, frames).await;
        if !self.tracker.is_current(cx) {
            return None;
        }
        self.send(SessionEvent::FramePositions {
            context: cx.clone(),
            positions: positions.clone(),
        });
        Some(positions)
    }

    /// Branch B: scopes for the selected frame, then watch expressions.
    async fn publish_scopes_and_watches(&self, cx: &ThreadContext, selected: Option<&Frame>) {
        let Some(frame) = selected else {
            return;
        };

        let scopes = match self.target.fetch_scopes(&frame.frame_id).await {
            Ok(scopes) => scopes,
            Err(err) => {
                // Without scopes the sourcemap-derived name mappings are
                // missing too, so watch re-evaluation is skipped; the
                // expressions stay marked loading until the next pause.
                warn!("scope fetch failed for frame {}: {}", frame.frame_id, err);
                return;
            }
        };
        if !self.tracker.is_current(cx) {
            return;
        }
        self.send(SessionEvent::ScopesLoaded {
            context: cx.clone(),
            frame_id: frame.frame_id.clone(),
            scopes,
        });

        let results = self.evaluate_watches(&frame.frame_id).await;
        if results.is_empty() || !self.tracker.is_current(cx) {
            return;
        }
        self.watches.apply(&results);
        self.send(SessionEvent::WatchResults {
            context: cx.clone(),
            results,
        });
    }

    /// Evaluate every pinned expression; one failure never affects its
    /// siblings — it becomes an inline error value.
    async fn evaluate_watches(&self, frame_id: &str) -> Vec<WatchResult> {
        let texts = self.watches.texts();
        join_all(texts.into_iter().map(|text| async move {
            let state = match self.target.evaluate(frame_id, &text).await {
                Ok(value) => WatchState::Value(value),
                Err(err) => WatchState::Error(err.to_string()),
            };
            WatchResult {
                expression: text,
                state,
            }
        }))
        .await
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PauseState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }
}
