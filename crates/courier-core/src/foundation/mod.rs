//! Foundation layer - the message model.
//!
//! This module contains the per-message types a transport hands to the
//! dispatcher:
//! - [`IncomingMessage`] and its [`ConversationKind`]
//! - [`ReplyTarget`] for addressing the answer

pub mod message;

pub use message::{ConversationKind, IncomingMessage, ReplyTarget, bare_identity};
