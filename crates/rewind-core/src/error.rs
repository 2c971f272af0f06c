//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Target/Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to connect to debug target: {message}")]
    Connect { message: String },

    #[error("Debug target error: {message}")]
    Target { message: String },

    #[error("Target protocol error: {message}")]
    Protocol { message: String },

    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────
    /// The pause this operation belonged to has been superseded by a
    /// newer one. Callers discard the result; never shown to the user.
    #[error("pause context is no longer current")]
    StaleContext,

    #[error("Expression evaluation failed: {message}")]
    Evaluation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid target URI: {uri}")]
    InvalidUri { uri: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn target(message: impl Into<String>) -> Self {
        Self::Target {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri { uri: uri.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors leave the session usable: the next pause or
    /// message can still be processed normally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Target { .. }
                | Error::Protocol { .. }
                | Error::ChannelSend { .. }
                | Error::StaleContext
                | Error::Evaluation { .. }
        )
    }

    /// Check if this error should abort the attach attempt
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. } | Error::InvalidUri { .. } | Error::Config { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::target("connection lost");
        assert_eq!(err.to_string(), "Debug target error: connection lost");

        let err = Error::invalid_uri("not-a-uri");
        assert!(err.to_string().contains("not-a-uri"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::target("test").is_recoverable());
        assert!(Error::protocol("parse error").is_recoverable());
        assert!(Error::StaleContext.is_recoverable());
        assert!(Error::evaluation("ReferenceError").is_recoverable());
        assert!(!Error::connect("refused").is_recoverable());
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::connect("refused").is_fatal());
        assert!(Error::invalid_uri("x").is_fatal());
        assert!(!Error::target("test").is_fatal());
        assert!(!Error::StaleContext.is_fatal());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::connect("test");
        let _ = Error::target("test");
        let _ = Error::protocol("test");
        let _ = Error::channel_send("test");
        let _ = Error::evaluation("test");
        let _ = Error::config("test");
    }
}
