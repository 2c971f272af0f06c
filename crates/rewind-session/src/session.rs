//! Session wiring — routes target notifications to the coordinator and
//! the console pipeline, and exposes the session event channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rewind_core::prelude::*;
use rewind_core::target::DebugTarget;
use rewind_core::TargetNotification;

use crate::breakpoints::BreakpointStore;
use crate::console::{ConsoleCommand, ConsolePipeline};
use crate::context::ThreadContext;
use crate::events::SessionEvent;
use crate::expressions::WatchStore;
use crate::pause::PauseCoordinator;

/// Capacity of the console command channel.
const CONSOLE_CHANNEL_CAPACITY: usize = 256;

/// One attached debugging session.
///
/// Owns the pause coordinator and the console pipeline task. Consumers
/// receive [`SessionEvent`]s on the channel returned by [`new`]; there
/// are no callbacks or ambient emitters.
///
/// [`new`]: DebugSession::new
pub struct DebugSession<T>
where
    T: DebugTarget + Send + Sync + 'static,
{
    target: Arc<T>,
    coordinator: Arc<PauseCoordinator<T>>,
    breakpoints: Arc<BreakpointStore>,
    watches: Arc<WatchStore>,
    console_tx: mpsc::Sender<ConsoleCommand>,
    pipeline: JoinHandle<()>,
}

impl<T> DebugSession<T>
where
    T: DebugTarget + Send + Sync + 'static,
{
    /// Create a session for `thread` on `target`.
    ///
    /// Spawns the console pipeline task and returns the session event
    /// receiver alongside the session.
    pub fn new(
        target: Arc<T>,
        thread: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (console_tx, console_rx) = mpsc::channel(CONSOLE_CHANNEL_CAPACITY);

        let breakpoints = Arc::new(BreakpointStore::new());
        let watches = Arc::new(WatchStore::new());

        let coordinator = Arc::new(PauseCoordinator::new(
            Arc::clone(&target),
            thread,
            Arc::clone(&breakpoints),
            Arc::clone(&watches),
            event_tx.clone(),
        ));

        let pipeline = ConsolePipeline::new(Arc::clone(&target), event_tx);
        let pipeline = tokio::spawn(pipeline.run(console_rx));

        (
            Self {
                target,
                coordinator,
                breakpoints,
                watches,
                console_tx,
                pipeline,
            },
            event_rx,
        )
    }

    /// Route one target notification to the component that owns it.
    pub async fn handle_notification(&self, notification: TargetNotification) {
        match notification {
            TargetNotification::Paused(point) => {
                self.coordinator.on_paused(point);
            }
            TargetNotification::NewScript(script) => {
                self.target
                    .record_script(&script.script_id, script.url.as_deref());
            }
            TargetNotification::ConsoleMessage(msg) => {
                self.forward(ConsoleCommand::Message(msg)).await;
            }
            TargetNotification::LogpointLoading(hit) => {
                self.forward(ConsoleCommand::LogpointLoading(hit)).await;
            }
            TargetNotification::LogpointResult(hit) => {
                self.forward(ConsoleCommand::LogpointResult(hit)).await;
            }
            TargetNotification::LogpointCleared { log_group_id } => {
                self.forward(ConsoleCommand::LogpointClear { log_group_id })
                    .await;
            }
            TargetNotification::Unknown { method, .. } => {
                trace!("ignoring unknown notification '{}'", method);
            }
        }
    }

    /// Clear all console messages, pending ones included.
    pub async fn clear_messages(&self) {
        self.forward(ConsoleCommand::ClearAll).await;
    }

    /// Evaluate an expression against the selected frame of the pause
    /// `cx` belongs to.
    ///
    /// # Errors
    ///
    /// [`Error::StaleContext`] when `cx` was superseded — the result of
    /// a stale evaluation must never reach consumers.
    pub async fn evaluate_expression(
        &self,
        cx: &ThreadContext,
        expression: &str,
    ) -> Result<serde_json::Value> {
        if !self.coordinator.is_current(cx) {
            return Err(Error::StaleContext);
        }
        let frame_id = self
            .coordinator
            .selected_frame_id()
            .ok_or_else(|| Error::evaluation("no frame selected"))?;
        let value = self.target.evaluate(&frame_id, expression).await?;
        if !self.coordinator.is_current(cx) {
            return Err(Error::StaleContext);
        }
        Ok(value)
    }

    pub fn coordinator(&self) -> &Arc<PauseCoordinator<T>> {
        &self.coordinator
    }

    pub fn breakpoints(&self) -> &Arc<BreakpointStore> {
        &self.breakpoints
    }

    pub fn watches(&self) -> &Arc<WatchStore> {
        &self.watches
    }

    /// Shut down the session: the pipeline flushes pending packets and
    /// exits.
    pub async fn shutdown(self) {
        drop(self.console_tx);
        let _ = self.pipeline.await;
    }

    async fn forward(&self, command: ConsoleCommand) {
        if self.console_tx.send(command).await.is_err() {
            warn!("console pipeline gone; dropping command");
        }
    }
}
