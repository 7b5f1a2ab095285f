//! Outbound transport interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::foundation::ReplyTarget;

/// The outbound half of a chat transport.
///
/// Implementations own addressing and delivery. The dispatcher calls
/// [`send_reply`](Transport::send_reply) once per reply and does not wait for
/// any delivery confirmation beyond the returned result, which it only logs.
///
/// # Example
///
/// ```rust,ignore
/// struct Console;
///
/// #[async_trait]
/// impl Transport for Console {
///     async fn send_reply(&self, target: &ReplyTarget, text: &str) -> TransportResult<()> {
///         println!("[{target}] {text}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends `text` into the conversation identified by `target`.
    async fn send_reply(&self, target: &ReplyTarget, text: &str) -> TransportResult<()>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_reply(&self, target: &ReplyTarget, text: &str) -> TransportResult<()> {
        (**self).send_reply(target, text).await
    }
}
