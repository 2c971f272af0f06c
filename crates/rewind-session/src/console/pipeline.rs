//! The console ingestion pipeline task.
//!
//! A single task consumes console commands, resolves message locations,
//! and delivers packets as coalesced batches: appending to an empty
//! batch arms one flush timer, further appends within the window are
//! absorbed, and when the timer fires the whole queue goes out as one
//! ordered batch. High message volume therefore costs one delivery per
//! window instead of one per message.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use rewind_core::events::LogpointHit;
use rewind_core::target::DebugTarget;
use rewind_core::{
    ConsoleMessagePacket, ExecutionPoint, MessageLevel, RawConsoleMessage, SourcePosition,
};

use super::logpoints::LogpointTracker;
use super::queue::PendingQueue;
use crate::events::SessionEvent;
use crate::resolver::{resolve_message_position, resolve_stack};

/// Fixed batching window.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Placeholder text shown while a logpoint hit is being evaluated.
pub const LOGPOINT_LOADING_TEXT: &str = "Loading...";

/// Commands consumed by the pipeline task.
#[derive(Debug)]
pub enum ConsoleCommand {
    /// A console message from the target.
    Message(RawConsoleMessage),
    /// A logpoint hit began evaluating.
    LogpointLoading(LogpointHit),
    /// A logpoint hit finished evaluating.
    LogpointResult(LogpointHit),
    /// Remove all packets of one log group.
    LogpointClear { log_group_id: String },
    /// Clear every message, delivered and pending alike.
    ClearAll,
}

/// Flush timer state machine.
///
/// `Pending` is entered by the first append into an empty window and
/// left only by the flush itself — appends never re-arm a running
/// timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushState {
    Idle,
    Pending { deadline: Instant },
}

/// Owns the pending queue, the flush timer, and the logpoint tracker.
///
/// Nothing else may touch these; all interaction goes through
/// [`ConsoleCommand`]s.
pub struct ConsolePipeline<T> {
    target: Arc<T>,
    queue: PendingQueue,
    logpoints: LogpointTracker,
    state: FlushState,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<T> ConsolePipeline<T>
where
    T: DebugTarget + Send + Sync + 'static,
{
    pub fn new(target: Arc<T>, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            target,
            queue: PendingQueue::new(),
            logpoints: LogpointTracker::new(),
            state: FlushState::Idle,
            events,
        }
    }

    /// Consume commands until the channel closes.
    ///
    /// Closing the channel flushes whatever is still pending — once
    /// appended, a packet is always eventually delivered or explicitly
    /// cleared.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ConsoleCommand>) {
        loop {
            match self.state {
                FlushState::Pending { deadline } => {
                    tokio::select! {
                        command = rx.recv() => match command {
                            Some(command) => self.handle(command).await,
                            None => {
                                self.flush();
                                break;
                            }
                        },
                        _ = sleep_until(deadline) => self.flush(),
                    }
                }
                FlushState::Idle => match rx.recv().await {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }
        debug!("console pipeline exiting");
    }

    async fn handle(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Message(msg) => {
                let packet = self.normalize_message(msg).await;
                self.append(packet);
            }
            ConsoleCommand::LogpointLoading(hit) => {
                if !self.logpoints.begin_loading(&hit.log_group_id) {
                    return;
                }
                let packet =
                    self.logpoint_packet(&hit, LOGPOINT_LOADING_TEXT.to_string(), Vec::new());
                self.append(packet);
            }
            ConsoleCommand::LogpointResult(hit) => {
                if !self.logpoints.record_result(&hit.log_group_id) {
                    return;
                }
                let values = hit.values.clone();
                let packet = self.logpoint_packet(&hit, String::new(), values);
                self.append(packet);
            }
            ConsoleCommand::LogpointClear { log_group_id } => {
                self.logpoints.clear(&log_group_id);
                let removed = self.queue.remove_log_group(&log_group_id);
                if removed > 0 {
                    debug!(
                        "dropped {} pending packet(s) of log group {}",
                        removed, log_group_id
                    );
                }
                self.send(SessionEvent::LogpointCleared { log_group_id });
            }
            ConsoleCommand::ClearAll => {
                // Drop pending additions too, so a clear is never
                // followed by ghost messages queued before it.
                self.queue.clear();
                self.send(SessionEvent::MessagesCleared);
            }
        }
    }

    /// Resolve locations and build the normalized packet for one message.
    ///
    /// Resolution failures degrade to best-effort positions; the message
    /// itself is never dropped.
    async fn normalize_message(&self, msg: RawConsoleMessage) -> ConsoleMessagePacket {
        let stack = match &msg.stack {
            Some(stack) => Some(resolve_stack(&*self.target, stack).await),
            None => None,
        };
        let position = resolve_message_position(&*self.target, &msg).await;

        let mut packet = ConsoleMessagePacket::new(msg.level, msg.source, msg.text);
        packet.position = position;
        packet.point = Some(ExecutionPoint::new(
            msg.point.point,
            msg.point.time,
            stack.is_some(),
        ));
        packet.stack = stack;
        packet.argument_values = msg.argument_values;
        packet
    }

    fn logpoint_packet(
        &self,
        hit: &LogpointHit,
        text: String,
        values: Vec<Value>,
    ) -> ConsoleMessagePacket {
        let url = self.target.script_url(&hit.location.script_id);
        let mut packet = ConsoleMessagePacket::new(MessageLevel::Info, "ConsoleAPI", text);
        packet.position = SourcePosition::resolved(
            url,
            hit.location.script_id.clone(),
            hit.location.line,
            hit.location.column,
        );
        packet.point = Some(ExecutionPoint::new(hit.point.clone(), hit.time, true));
        packet.argument_values = values;
        packet.logpoint_id = Some(hit.log_group_id.clone());
        packet
    }

    /// Append a packet, arming the flush timer if none is running.
    fn append(&mut self, packet: ConsoleMessagePacket) {
        self.queue.push(packet);
        if self.state == FlushState::Idle {
            self.state = FlushState::Pending {
                deadline: Instant::now() + FLUSH_INTERVAL,
            };
        }
    }

    /// Deliver the whole queue as one ordered batch and disarm the timer.
    fn flush(&mut self) {
        self.state = FlushState::Idle;
        let batch = self.queue.take_all();
        if !batch.is_empty() {
            self.send(SessionEvent::MessageBatch(batch));
        }
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }
}
