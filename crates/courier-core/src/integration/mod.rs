//! Integration layer - interfaces towards the chat transport.
//!
//! - [`Transport`]: outbound, sends replies
//! - [`Dispatcher`]: inbound, receives message events

pub mod dispatcher;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use transport::{BoxedTransport, Transport};
