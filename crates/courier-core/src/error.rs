//! Error types shared across the Courier crates.
//!
//! Command handlers report failures as a [`BoxError`] so that any error type
//! (including `anyhow::Error`) can be propagated with `?`. Transport failures
//! have their own enum because the router logs them differently.

use thiserror::Error;

/// A type-erased error returned by command handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors a [`Transport`](crate::Transport) may report when sending a reply.
///
/// Delivery is fire-and-forget from the router's point of view: these errors
/// are logged and never travel back into command routing.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// The reply target could not be addressed.
    #[error("cannot address reply target '{target}': {reason}")]
    InvalidTarget {
        /// The target that failed.
        target: String,
        /// Reason for failure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send reply: {0}")]
    SendFailed(String),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
