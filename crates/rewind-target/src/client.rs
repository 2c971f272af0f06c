//! Async WebSocket client for the remote debug target.
//!
//! The [`TargetClient`] connects to a record-and-replay target over
//! WebSocket, sends JSON-RPC 2.0 requests, routes responses back to
//! callers via oneshot channels, and forwards notifications through an
//! mpsc channel.
//!
//! There is deliberately no automatic reconnection: a recording session
//! is stateful per connection — pauses, logpoint groups, and script ids
//! do not survive the socket — so on disconnect the client emits
//! [`ClientEvent::Disconnected`] and the caller re-attaches from
//! scratch.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use rewind_core::prelude::*;
use rewind_core::TargetNotification;

use super::protocol::{
    parse_target_message, RequestTracker, TargetMessage, TargetRequest, TargetResponse,
    TargetRpcError,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capacity of the command channel (bounded, to apply backpressure).
const CMD_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the event channel (bounded, notifications can be bursty).
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How often to run stale request cleanup in the I/O loop.
const STALE_REQUEST_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout after which a pending request is considered stale and removed.
const STALE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Current connection state of a [`TargetClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial connection attempt in progress.
    Connecting,
    /// Connected and ready to exchange messages.
    Connected,
    /// Connection closed or lost; the client will not reconnect.
    Disconnected,
}

/// Events emitted by the client through the event channel.
#[derive(Debug)]
pub enum ClientEvent {
    /// A typed notification from the target.
    Notification(TargetNotification),
    /// The connection ended; no further events will arrive.
    Disconnected,
}

// ---------------------------------------------------------------------------
// Internal command type
// ---------------------------------------------------------------------------

/// Internal messages sent from the public API to the background task.
enum ClientCommand {
    /// Send a JSON-RPC request and deliver the response to `response_tx`.
    SendRequest {
        method: String,
        params: Option<serde_json::Value>,
        response_tx: oneshot::Sender<Result<serde_json::Value>>,
    },
    /// Gracefully close the WebSocket connection and stop the background task.
    Disconnect,
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ---------------------------------------------------------------------------
// RequestHandle
// ---------------------------------------------------------------------------

/// A clonable handle for making target RPC requests.
///
/// Shares the underlying WebSocket connection with the [`TargetClient`]
/// that created it. The handle becomes inoperable when the client (or
/// its background task) is dropped — requests return
/// [`Error::ChannelClosed`].
#[derive(Clone)]
pub struct RequestHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("connection_state", &self.connection_state())
            .finish()
    }
}

impl RequestHandle {
    /// Send a JSON-RPC request and wait for the response.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the background task has exited.
    /// - [`Error::Protocol`] if the target returned a JSON-RPC error.
    /// - [`Error::Target`] if the response had neither result nor error.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let (response_tx, response_rx) = oneshot::channel();

        self.cmd_tx
            .send(ClientCommand::SendRequest {
                method: method.to_string(),
                params,
                response_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Return the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Return `true` if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Create a `RequestHandle` backed by a disconnected dummy channel.
    ///
    /// Intended for unit tests that need a handle but do not make real
    /// RPC calls.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test() -> Self {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        Self {
            cmd_tx,
            state: Arc::new(std::sync::RwLock::new(ConnectionState::Connected)),
        }
    }
}

// ---------------------------------------------------------------------------
// TargetClient
// ---------------------------------------------------------------------------

/// Async WebSocket client for a record-and-replay debug target.
///
/// Create with [`TargetClient::connect`], then use [`request`] to issue
/// JSON-RPC calls and [`event_receiver`] to consume notifications.
///
/// The client spawns a background Tokio task that owns the WebSocket
/// connection. The task cleans up automatically when `TargetClient` is
/// dropped (the command channel closes, which signals the task to exit).
#[derive(Debug)]
pub struct TargetClient {
    /// Shared request handle — owns the cmd_tx and connection state.
    handle: RequestHandle,
    /// Notification receiver (not clonable; owned exclusively by this client).
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl TargetClient {
    /// Connect to the debug target at `ws_uri` and return a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] for a non-WebSocket URI and
    /// [`Error::Connect`] if the connection cannot be established.
    pub async fn connect(ws_uri: &str) -> Result<Self> {
        let parsed = url::Url::parse(ws_uri).map_err(|_| Error::invalid_uri(ws_uri))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::invalid_uri(ws_uri));
        }

        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(CMD_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(EVENT_CHANNEL_CAPACITY);
        let state = Arc::new(std::sync::RwLock::new(ConnectionState::Connecting));

        info!("Connecting to debug target at {}", ws_uri);
        let (ws_stream, _response) = connect_async(ws_uri)
            .await
            .map_err(|err| Error::connect(format!("{ws_uri}: {err}")))?;

        {
            let mut guard = state.write().unwrap_or_else(|e| e.into_inner());
            *guard = ConnectionState::Connected;
        }

        tokio::spawn(run_client_task(ws_stream, cmd_rx, event_tx, Arc::clone(&state)));

        Ok(Self {
            handle: RequestHandle { cmd_tx, state },
            event_rx,
        })
    }

    /// Create a clonable request handle that shares this client's connection.
    pub fn request_handle(&self) -> RequestHandle {
        self.handle.clone()
    }

    /// Send a JSON-RPC request and wait for the response.
    ///
    /// Delegates to the internal [`RequestHandle`].
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.handle.request(method, params).await
    }

    /// Return a mutable reference to the notification receiver.
    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<ClientEvent> {
        &mut self.event_rx
    }

    /// Return the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.handle.connection_state()
    }

    /// Return `true` if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    /// Gracefully close the WebSocket connection.
    ///
    /// Sends a disconnect command to the background task and returns
    /// immediately. The task will send a Close frame and then terminate.
    pub async fn disconnect(&self) {
        // Ignore the send error — if the channel is already closed the task
        // has already exited.
        let _ = self.handle.cmd_tx.send(ClientCommand::Disconnect).await;
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

/// Entry point for the background WebSocket I/O task.
async fn run_client_task(
    ws_stream: WsStream,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::Sender<ClientEvent>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
) {
    let mut tracker = RequestTracker::new();
    let lost = run_io_loop(ws_stream, &mut cmd_rx, &event_tx, &mut tracker).await;

    {
        let mut guard = state.write().unwrap_or_else(|e| e.into_inner());
        *guard = ConnectionState::Disconnected;
    }

    if lost {
        // Unexpected end of stream — tell the consumer before exiting.
        let _ = event_tx.send(ClientEvent::Disconnected).await;
    }

    debug!("target client background task exiting");
}

/// Run the connection's read/write select loop.
///
/// Returns `true` if the connection was lost unexpectedly, `false` on a
/// clean shutdown (Disconnect command or client dropped).
async fn run_io_loop(
    ws_stream: WsStream,
    cmd_rx: &mut mpsc::Receiver<ClientCommand>,
    event_tx: &mpsc::Sender<ClientEvent>,
    tracker: &mut RequestTracker,
) -> bool {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    let mut cleanup_interval = tokio::time::interval(STALE_REQUEST_CLEANUP_INTERVAL);
    cleanup_interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            // ── Incoming WebSocket message ───────────────────────────────
            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_ws_text(text.as_str(), tracker, event_tx).await;
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        debug!("target: received Close frame");
                        return true;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/Binary — ignore
                    }
                    Some(Err(err)) => {
                        warn!("target: WebSocket read error: {}", err);
                        return true;
                    }
                    None => {
                        debug!("target: WebSocket stream ended");
                        return true;
                    }
                }
            }

            // ── Outgoing command from the public API ─────────────────────
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::SendRequest { method, params, response_tx }) => {
                        handle_send_request(
                            &method,
                            params,
                            response_tx,
                            tracker,
                            &mut ws_sink,
                        )
                        .await;
                    }
                    Some(ClientCommand::Disconnect) => {
                        send_close(&mut ws_sink).await;
                        return false;
                    }
                    None => {
                        // The TargetClient was dropped — close gracefully.
                        debug!("target: command channel closed, shutting down");
                        send_close(&mut ws_sink).await;
                        return false;
                    }
                }
            }

            // ── Periodic stale request cleanup ──────────────────────────
            _ = cleanup_interval.tick() => {
                let stale = tracker.cleanup_stale(STALE_REQUEST_TIMEOUT);
                if !stale.is_empty() {
                    debug!(
                        "target: cleaned up {} stale request(s): {:?}",
                        stale.len(),
                        stale,
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Route an incoming WebSocket text frame to the tracker or event channel.
async fn handle_ws_text(
    text: &str,
    tracker: &mut RequestTracker,
    event_tx: &mpsc::Sender<ClientEvent>,
) {
    match parse_target_message(text) {
        TargetMessage::Response(mut response) => {
            if let Some(id) = response.id.take() {
                if !tracker.complete(&id, response) {
                    debug!("target: received response for unknown request id {}", id);
                }
            }
        }
        TargetMessage::Notification { method, params } => {
            match TargetNotification::parse(&method, params) {
                Some(notification) => {
                    if let Err(err) = event_tx.try_send(ClientEvent::Notification(notification)) {
                        warn!(
                            "target: event channel full or closed, dropping notification: {}",
                            err
                        );
                    }
                }
                None => {
                    debug!("target: malformed '{}' notification ignored", method);
                }
            }
        }
        TargetMessage::Unknown(raw) => {
            debug!(
                "target: ignoring unknown message: {}",
                &raw[..raw.len().min(120)]
            );
        }
    }
}

/// Register a pending request in the tracker, serialize it, and write it to
/// the WebSocket sink. Delivers an error to `response_tx` if serialization
/// or send fails.
async fn handle_send_request(
    method: &str,
    params: Option<serde_json::Value>,
    response_tx: oneshot::Sender<Result<serde_json::Value>>,
    tracker: &mut RequestTracker,
    ws_sink: &mut SplitSink<WsStream, WsMessage>,
) {
    // Register a slot in the tracker before touching the wire so the slot
    // exists if the response races the send.
    let (id, response_rx) = tracker.register();
    let request = TargetRequest::new(id, method, params);

    let json = match serde_json::to_string(&request) {
        Ok(j) => j,
        Err(err) => {
            let e = Error::protocol(format!("Failed to serialize target request: {err}"));
            let _ = response_tx.send(Err(e));
            return;
        }
    };

    if let Err(err) = ws_sink.send(WsMessage::Text(json.into())).await {
        let e = Error::target(format!("Failed to send target request: {err}"));
        let _ = response_tx.send(Err(e));
        return;
    }

    // Spawn a task to wait for the response and forward it to `response_tx`.
    tokio::spawn(async move {
        match response_rx.await {
            Ok(response) => {
                let result = response_to_result(response);
                let _ = response_tx.send(result);
            }
            Err(_) => {
                // oneshot sender in the tracker was dropped (stale cleanup
                // or shutdown).
                let _ = response_tx.send(Err(Error::ChannelClosed));
            }
        }
    });
}

/// Convert a [`TargetResponse`] to a [`Result<serde_json::Value>`].
fn response_to_result(response: TargetResponse) -> Result<serde_json::Value> {
    if let Some(error) = response.error {
        Err(rpc_error_to_error(error))
    } else if let Some(result) = response.result {
        Ok(result)
    } else {
        Err(Error::target(
            "target response contained neither result nor error",
        ))
    }
}

/// Convert a [`TargetRpcError`] to our domain [`Error`].
fn rpc_error_to_error(err: TargetRpcError) -> Error {
    Error::protocol(format!("target error {}: {}", err.code, err.message))
}

/// Send a WebSocket Close frame, ignoring any write errors.
async fn send_close(ws_sink: &mut SplitSink<WsStream, WsMessage>) {
    let _ = ws_sink.send(WsMessage::Close(None)).await;
    let _ = ws_sink.close().await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
