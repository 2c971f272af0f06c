//! Typed notifications pushed by the debug target.
//!
//! The target emits JSON-RPC notifications (no `id` field) on its
//! WebSocket connection. [`TargetNotification::parse`] maps a raw
//! `(method, params)` pair into a typed event; unknown methods are
//! preserved so the transport layer can log them without failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::point::ExecutionPoint;
use crate::types::{Location, MessageLevel};

// ─────────────────────────────────────────────────────────
// Notification payloads
// ─────────────────────────────────────────────────────────

/// Where in the recording a console message was produced.
///
/// `frame` is present when the point has stack frames; its location is
/// the authoritative, source-mapped position of the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDescription {
    pub point: String,
    pub time: f64,
    #[serde(default)]
    pub frame: Option<Location>,
}

impl PointDescription {
    /// The execution point this description names.
    pub fn execution_point(&self) -> ExecutionPoint {
        ExecutionPoint::new(self.point.clone(), self.time, self.frame.is_some())
    }
}

/// One unresolved frame of a console message's stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStackFrame {
    pub frame_id: String,
    #[serde(default)]
    pub function_name: Option<String>,
    pub location: Location,
}

/// A console message as the target reports it, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConsoleMessage {
    /// Producer category, e.g. `"ConsoleAPI"` or `"PageError"`.
    pub source: String,
    pub level: MessageLevel,
    pub text: String,
    /// Script URL as the page saw it; may not match any known script.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub script_id: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    pub point: PointDescription,
    #[serde(default)]
    pub argument_values: Vec<Value>,
    /// Call stack at the message site, outermost call last.
    #[serde(default)]
    pub stack: Option<Vec<RawStackFrame>>,
}

/// `Debugger.scriptParsed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScript {
    pub script_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// `Debugger.paused` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedNotification {
    pub point: String,
    pub time: f64,
    #[serde(default)]
    pub has_frames: bool,
}

/// Shared payload of `Logpoint.loading` and `Logpoint.result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogpointHit {
    pub log_group_id: String,
    pub point: String,
    pub time: f64,
    pub location: Location,
    /// Evaluated values; present on `Logpoint.result` only.
    #[serde(default)]
    pub values: Vec<Value>,
}

// ─────────────────────────────────────────────────────────
// TargetNotification Enum
// ─────────────────────────────────────────────────────────

/// Fully typed target notification
#[derive(Debug, Clone)]
pub enum TargetNotification {
    /// Execution paused at a point in the recording.
    Paused(ExecutionPoint),
    /// A script became known; feeds the url ↔ script-id index.
    NewScript(NewScript),
    /// A console/log event was found in the recording.
    ConsoleMessage(RawConsoleMessage),
    /// A logpoint hit began evaluating.
    LogpointLoading(LogpointHit),
    /// A logpoint hit finished evaluating.
    LogpointResult(LogpointHit),
    /// A logpoint was removed; drop all of its packets.
    LogpointCleared { log_group_id: String },

    /// Fallback for methods this client does not understand.
    Unknown { method: String, params: Value },
}

impl TargetNotification {
    /// Parse a JSON-RPC notification into a typed event.
    ///
    /// Payloads that fail to deserialize are reported as `None` so the
    /// caller can log the malformed notification and move on — a bad
    /// event must never tear down the connection.
    pub fn parse(method: &str, params: Value) -> Option<TargetNotification> {
        match method {
            "Debugger.paused" => {
                let p: PausedNotification = serde_json::from_value(params).ok()?;
                Some(TargetNotification::Paused(ExecutionPoint::new(
                    p.point,
                    p.time,
                    p.has_frames,
                )))
            }
            "Debugger.scriptParsed" => {
                let script: NewScript = serde_json::from_value(params).ok()?;
                Some(TargetNotification::NewScript(script))
            }
            "Console.newMessage" => {
                let msg: RawConsoleMessage = serde_json::from_value(params).ok()?;
                Some(TargetNotification::ConsoleMessage(msg))
            }
            "Logpoint.loading" => {
                let hit: LogpointHit = serde_json::from_value(params).ok()?;
                Some(TargetNotification::LogpointLoading(hit))
            }
            "Logpoint.result" => {
                let hit: LogpointHit = serde_json::from_value(params).ok()?;
                Some(TargetNotification::LogpointResult(hit))
            }
            "Logpoint.cleared" => {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct Cleared {
                    log_group_id: String,
                }
                let c: Cleared = serde_json::from_value(params).ok()?;
                Some(TargetNotification::LogpointCleared {
                    log_group_id: c.log_group_id,
                })
            }
            _ => Some(TargetNotification::Unknown {
                method: method.to_string(),
                params,
            }),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            TargetNotification::Paused(_) => "paused",
            TargetNotification::NewScript(_) => "newScript",
            TargetNotification::ConsoleMessage(_) => "consoleMessage",
            TargetNotification::LogpointLoading(_) => "logpointLoading",
            TargetNotification::LogpointResult(_) => "logpointResult",
            TargetNotification::LogpointCleared { .. } => "logpointCleared",
            TargetNotification::Unknown { .. } => "unknown",
        }
    }
}
