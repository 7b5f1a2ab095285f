//! Handler system for command invocation.
//!
//! A command handler receives the [`IncomingMessage`] and the argument string
//! and produces a reply. Any async function or closure with the signature
//! `Fn(Arc<IncomingMessage>, String) -> impl Future<Output = R>` can be used,
//! where `R` implements [`IntoReply`]:
//!
//! | Return type            | Reply                          |
//! |------------------------|--------------------------------|
//! | `()`                   | nothing                        |
//! | `String` / `&'static str` | the text                    |
//! | `Option<T>`            | `T`'s reply, or nothing        |
//! | `Result<T, E>`         | `T`'s reply, or a failure      |
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_framework::CommandSpec;
//!
//! let uptime = CommandSpec::new("uptime", |_msg, _args| async move { "up 3 days" });
//!
//! let roll = CommandSpec::new("roll", |_msg, args: String| async move {
//!     let sides: u32 = args.trim().parse()?;
//!     Ok::<_, std::num::ParseIntError>(format!("rolled a d{sides}"))
//! });
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use courier_core::{BoxError, IncomingMessage};

/// What a handler produced: a reply, no reply, or a failure.
pub type HandlerResult = Result<Option<String>, BoxError>;

// ============================================================================
// IntoReply
// ============================================================================

/// A trait for types that can be returned from command handlers.
pub trait IntoReply: Send + 'static {
    /// Converts the handler's return value into a [`HandlerResult`].
    fn into_reply(self) -> HandlerResult;
}

/// `()` - no reply.
impl IntoReply for () {
    fn into_reply(self) -> HandlerResult {
        Ok(None)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> HandlerResult {
        Ok(Some(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> HandlerResult {
        Ok(Some(self.to_owned()))
    }
}

/// On `None` nothing is sent.
impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> HandlerResult {
        match self {
            Some(t) => t.into_reply(),
            None => Ok(None),
        }
    }
}

/// On `Err` the router replaces the reply with its generic error text.
impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError> + Send + 'static,
{
    fn into_reply(self) -> HandlerResult {
        match self {
            Ok(t) => t.into_reply(),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// CommandHandler
// ============================================================================

/// Type-erased command handler.
///
/// Implement this directly for handlers that carry their own state; plain
/// functions and closures are wrapped by [`HandlerFn`].
pub trait CommandHandler: Send + Sync + 'static {
    /// Invokes the handler with the message and its argument string.
    fn call(&self, msg: Arc<IncomingMessage>, args: String) -> BoxFuture<'static, HandlerResult>;
}

/// A shared, type-erased command handler.
pub type BoxedHandler = Arc<dyn CommandHandler>;

/// Wraps an async function or closure into a [`CommandHandler`].
pub struct HandlerFn<F, Fut, R> {
    f: F,
    _marker: PhantomData<fn() -> (Fut, R)>,
}

impl<F, Fut, R> HandlerFn<F, Fut, R> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, Fut, R> CommandHandler for HandlerFn<F, Fut, R>
where
    F: Fn(Arc<IncomingMessage>, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    fn call(&self, msg: Arc<IncomingMessage>, args: String) -> BoxFuture<'static, HandlerResult> {
        (self.f)(msg, args).map(IntoReply::into_reply).boxed()
    }
}

/// Converts a function into a [`BoxedHandler`].
pub fn into_handler<F, Fut, R>(f: F) -> BoxedHandler
where
    F: Fn(Arc<IncomingMessage>, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    Arc::new(HandlerFn::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> Arc<IncomingMessage> {
        Arc::new(IncomingMessage::direct("alice@example.org", "!test"))
    }

    #[tokio::test]
    async fn test_string_reply() {
        let handler = into_handler(|_msg, args| async move { format!("got {args}") });
        let reply = handler.call(msg(), "x y".into()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("got x y"));
    }

    #[tokio::test]
    async fn test_unit_reply_is_silent() {
        let handler = into_handler(|_msg, _args| async move {});
        assert!(handler.call(msg(), String::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_result_err_is_failure() {
        let handler = into_handler(|_msg, args: String| async move {
            args.parse::<u32>().map(|n| format!("{}", n + 1))
        });
        assert_eq!(
            handler.call(msg(), "41".into()).await.unwrap().as_deref(),
            Some("42")
        );
        assert!(handler.call(msg(), "nope".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_handler_sees_message() {
        let handler = into_handler(|msg: Arc<IncomingMessage>, _args| async move {
            msg.sender().to_string()
        });
        let reply = handler.call(msg(), String::new()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("alice@example.org"));
    }
}
