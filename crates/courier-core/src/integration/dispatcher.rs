//! Inbound dispatch interface.

use async_trait::async_trait;

use crate::foundation::IncomingMessage;

/// The inbound half of the transport boundary.
///
/// A transport (or the runtime's delivery loop) calls
/// [`dispatch`](Dispatcher::dispatch) once per received message. The call
/// never fails: every fault raised while handling the message is contained
/// on the dispatcher's side.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Processes one incoming message, sending any reply through the transport.
    async fn dispatch(&self, msg: IncomingMessage);
}
