//! # Courier Core
//!
//! The core types shared by every layer of the Courier command dispatcher.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! The message model handed over by a transport:
//! - **Incoming messages**: [`IncomingMessage`] with its [`ConversationKind`]
//! - **Reply addressing**: [`ReplyTarget`], derived from the message
//!
//! ### Integration Layer
//!
//! The two narrow seams between the dispatcher and a chat transport:
//! - **Inbound**: [`Dispatcher`], called once per delivered message
//! - **Outbound**: [`Transport`], used to send a reply back
//!
//! ```text
//! ┌─────────────┐  dispatch(msg)  ┌────────────┐  send_reply(target, text)  ┌─────────────┐
//! │  Transport  │────────────────▶│   Router   │───────────────────────────▶│  Transport  │
//! │  (inbound)  │                 │ (framework)│                            │ (outbound)  │
//! └─────────────┘                 └────────────┘                            └─────────────┘
//! ```

pub mod error;
pub mod foundation;
pub mod integration;

pub use error::{BoxError, TransportError, TransportResult};
pub use foundation::{ConversationKind, IncomingMessage, ReplyTarget, bare_identity};
pub use integration::{BoxedTransport, Dispatcher, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{BoxError, TransportError, TransportResult};
    pub use super::foundation::*;
    pub use super::integration::*;
}
