//! Error types for the Courier framework.

use std::any::Any;

use thiserror::Error;

use courier_core::BoxError;

/// A fault raised while a command handler ran.
///
/// The router never lets one of these escape: it is logged with the message
/// context and the user gets the generic error reply instead.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("handler returned an error: {0}")]
    Error(#[source] BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The task running a threaded handler was cancelled or aborted.
    #[error("handler task did not complete: {0}")]
    Aborted(String),
}

impl HandlerFailure {
    /// Builds a [`HandlerFailure::Panic`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panic(message)
    }
}
