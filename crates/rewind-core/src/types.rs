//! Domain types for paused state and console messages.

use chrono::{DateTime, Local};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────
// Source Locations
// ─────────────────────────────────────────────────────────

/// A script-relative source location as reported by the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Target-assigned script identifier.
    pub script_id: String,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

impl Location {
    pub fn new(script_id: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            script_id: script_id.into(),
            line,
            column,
        }
    }
}

/// A best-effort, human-facing source position.
///
/// Produced by location resolution: `url` and `script_id` are filled in
/// when the lookup succeeded, and left empty when the location could not
/// be mapped. A position is never an error — unresolved positions still
/// name their line/column so messages stay displayable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourcePosition {
    /// Resolved script URL, if known.
    pub url: Option<String>,
    /// Resolved script id, if known.
    pub script_id: Option<String>,
    /// 1-based line number.
    pub line: Option<u32>,
    /// 0-based column number.
    pub column: Option<u32>,
}

impl SourcePosition {
    /// Position naming a resolved script.
    pub fn resolved(url: Option<String>, script_id: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            url,
            script_id: Some(script_id.into()),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Unmapped fallback carrying whatever the message supplied.
    pub fn unresolved(url: Option<String>, line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            url,
            script_id: None,
            line,
            column,
        }
    }

    /// Short display name: the last path segment of the URL, percent-decoded.
    pub fn display_name(&self) -> Option<String> {
        self.url.as_deref().map(short_source_name)
    }
}

/// Shorten a script URL for display: strip the path, percent-decode.
pub fn short_source_name(url: &str) -> String {
    let tail = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url);
    percent_decode_str(tail)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| tail.to_string())
}

// ─────────────────────────────────────────────────────────
// Frames & Scopes
// ─────────────────────────────────────────────────────────

/// One stack frame of a paused target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Identity of the frame within its pause.
    pub frame_id: String,
    /// Name of the executing function, if the target knows it.
    #[serde(default)]
    pub function_name: Option<String>,
    /// Raw (unmapped) location of the frame.
    pub location: Location,
}

/// A resolved stack frame attached to a console message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Resolved script URL, if known.
    pub filename: Option<String>,
    pub script_id: String,
    pub line: u32,
    pub column: u32,
    pub function_name: Option<String>,
}

/// Kind of a variable scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    With,
    #[serde(other)]
    Other,
}

/// One variable binding within a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// Variable bindings for one frame, fetched lazily per pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub scope_id: String,
    pub kind: ScopeKind,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

// ─────────────────────────────────────────────────────────
// Console Messages
// ─────────────────────────────────────────────────────────

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Error,
    Warning,
    Info,
    Trace,
    Assert,
    #[serde(other)]
    Log,
}

impl MessageLevel {
    pub fn is_error(&self) -> bool {
        matches!(self, MessageLevel::Error | MessageLevel::Assert)
    }

    /// Lowercase label used in output streams.
    pub fn label(&self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
            MessageLevel::Info => "info",
            MessageLevel::Trace => "trace",
            MessageLevel::Assert => "assert",
            MessageLevel::Log => "log",
        }
    }
}

/// A normalized console/log event, ready for delivery to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMessagePacket {
    /// The message text (or error text for page errors).
    pub text: String,
    pub level: MessageLevel,
    /// Producer category, e.g. `"ConsoleAPI"` or `"PageError"`.
    pub category: String,
    /// Resolved primary source position of the message.
    pub position: SourcePosition,
    /// Resolved stack trace, preserving the target's frame order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<StackFrame>>,
    /// Evaluated argument values, e.g. the arguments of `console.log`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub argument_values: Vec<Value>,
    /// Where in the recording the message was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<crate::point::ExecutionPoint>,
    /// Log-group identity for logpoint-produced packets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logpoint_id: Option<String>,
    /// When this client received the message.
    pub received_at: DateTime<Local>,
}

impl ConsoleMessagePacket {
    /// Minimal packet constructor; resolution fills in the rest.
    pub fn new(level: MessageLevel, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level,
            category: category.into(),
            position: SourcePosition::default(),
            stack: None,
            argument_values: Vec::new(),
            point: None,
            logpoint_id: None,
            received_at: Local::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_source_name() {
        assert_eq!(
            short_source_name("https://example.com/static/js/app.js"),
            "app.js"
        );
        assert_eq!(short_source_name("app.js"), "app.js");
        assert_eq!(
            short_source_name("https://example.com/my%20script.js"),
            "my script.js"
        );
        // Trailing slash falls back to the full URL
        assert_eq!(
            short_source_name("https://example.com/"),
            "https://example.com/"
        );
    }

    #[test]
    fn test_message_level_parsing() {
        let level: MessageLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(level, MessageLevel::Warning);

        // Unknown levels fall back to Log
        let level: MessageLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, MessageLevel::Log);
    }

    #[test]
    fn test_message_level_is_error() {
        assert!(MessageLevel::Error.is_error());
        assert!(MessageLevel::Assert.is_error());
        assert!(!MessageLevel::Info.is_error());
        assert!(!MessageLevel::Trace.is_error());
    }

    #[test]
    fn test_scope_deserialize() {
        let scope: Scope = serde_json::from_str(
            r#"{"scopeId":"s1","kind":"function","bindings":[{"name":"x","value":42}]}"#,
        )
        .unwrap();
        assert_eq!(scope.kind, ScopeKind::Function);
        assert_eq!(scope.bindings.len(), 1);
        assert_eq!(scope.bindings[0].name, "x");
    }

    #[test]
    fn test_frame_deserialize() {
        let frame: Frame = serde_json::from_str(
            r#"{"frameId":"f0","functionName":"main","location":{"scriptId":"42","line":10,"column":2}}"#,
        )
        .unwrap();
        assert_eq!(frame.frame_id, "f0");
        assert_eq!(frame.location.line, 10);
    }

    #[test]
    fn test_packet_new_defaults() {
        let packet = ConsoleMessagePacket::new(MessageLevel::Info, "ConsoleAPI", "hello");
        assert_eq!(packet.text, "hello");
        assert!(packet.position.url.is_none());
        assert!(packet.stack.is_none());
        assert!(packet.logpoint_id.is_none());
        assert!(!packet.is_error());
    }
}
