//! JSON-RPC 2.0 protocol types for the debug target WebSocket interface.
//!
//! The target communicates over WebSocket using JSON-RPC 2.0. This module
//! defines the types for requests, responses, and notifications, plus a
//! request tracker for correlating async responses with their originating
//! requests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request to the debug target.
#[derive(Debug, Serialize)]
pub struct TargetRequest {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Unique request ID used to correlate the response.
    pub id: String,
    /// Method name, e.g. `"Pause.getAllFrames"`.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl TargetRequest {
    pub fn new(id: String, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response from the debug target.
#[derive(Debug, Deserialize)]
pub struct TargetResponse {
    /// The ID matching the original request. `None` for notifications.
    pub id: Option<String>,
    /// Successful result payload.
    pub result: Option<Value>,
    /// Error payload, present when the call failed.
    pub error: Option<TargetRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
pub struct TargetRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    pub data: Option<Value>,
}

// ---------------------------------------------------------------------------
// Parsed message discriminant
// ---------------------------------------------------------------------------

/// The result of parsing a raw target WebSocket text frame.
#[derive(Debug)]
pub enum TargetMessage {
    /// A response to a request we sent (has an `id` field).
    Response(TargetResponse),
    /// An unsolicited notification (no `id`, has a `method`).
    Notification { method: String, params: Value },
    /// A message we received but could not fully interpret.
    Unknown(String),
}

/// Parse a raw WebSocket text message into a typed [`TargetMessage`].
///
/// Dispatch logic:
/// - If the JSON has a top-level `"id"` field → treat as [`TargetResponse`].
/// - If the JSON has a top-level `"method"` field (no `"id"`) → treat as
///   a notification.
/// - Anything else → [`TargetMessage::Unknown`].
pub fn parse_target_message(text: &str) -> TargetMessage {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return TargetMessage::Unknown(text.to_string()),
    };

    let has_id = value.get("id").is_some_and(|v| !v.is_null());
    let has_method = value.get("method").is_some();

    if has_id {
        // Response to one of our requests
        match serde_json::from_value::<TargetResponse>(value) {
            Ok(response) => TargetMessage::Response(response),
            Err(_) => TargetMessage::Unknown(text.to_string()),
        }
    } else if has_method {
        // Unsolicited notification
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        TargetMessage::Notification { method, params }
    } else {
        TargetMessage::Unknown(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request tracker
// ---------------------------------------------------------------------------

/// A pending request awaiting its response.
struct PendingRequest {
    response_tx: oneshot::Sender<TargetResponse>,
    registered_at: Instant,
}

/// Correlates request IDs with response receivers.
///
/// Owned exclusively by the background I/O task; no interior locking.
#[derive(Default)]
pub struct RequestTracker {
    next_id: u64,
    pending: HashMap<String, PendingRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request slot and return its id plus the receiver
    /// the response will be delivered on.
    pub fn register(&mut self) -> (String, oneshot::Receiver<TargetResponse>) {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let (response_tx, response_rx) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest {
                response_tx,
                registered_at: Instant::now(),
            },
        );
        (id, response_rx)
    }

    /// Deliver a response to its waiting request.
    ///
    /// Returns `false` if the id is unknown (already completed, cleaned
    /// up as stale, or never ours).
    pub fn complete(&mut self, id: &str, response: TargetResponse) -> bool {
        match self.pending.remove(id) {
            Some(pending) => {
                // The caller may have given up waiting; a dropped
                // receiver is not an error.
                let _ = pending.response_tx.send(response);
                true
            }
            None => false,
        }
    }

    /// Drop requests older than `timeout`, returning their ids.
    pub fn cleanup_stale(&mut self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();
        let stale: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.registered_at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.pending.remove(id);
        }
        stale
    }

    /// Number of requests still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
