//! # Courier
//!
//! A small, dependable command dispatcher for chat bots.
//!
//! ## Overview
//!
//! A chat transport delivers incoming messages; Courier decides whether each
//! one is a command, runs the matching handler and sends the reply back.
//! Handler failures are contained: the user gets a generic apology and the
//! fault is logged.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  inbound  ┌──────────────┐  lookup  ┌──────────────┐
//! │  Transport  │──────────▶│   Runtime    │─────────▶│   Registry   │
//! │             │           │   + Router   │          └──────────────┘
//! │             │◀──────────│              │─────────▶ handler / help / fallback
//! └─────────────┘send_reply └──────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, runs the inbound loop
//! - **Router**: applies the direct and group routing rules
//! - **Registry**: command specs by key, fed directly or by providers
//! - **Hooks**: the unknown-command fallback and help decorations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder().build(MyTransport::connect().await?)?;
//!
//!     runtime.register(
//!         CommandSpec::new("ping", |_msg, _args| async move { "pong" })
//!             .doc("Answers with pong."),
//!     );
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use courier_runtime::{CourierConfig, CourierRuntime, InboundSender};

    // Commands
    pub use courier_framework::{
        CommandProvider, CommandRegistry, CommandSpec, HandlerResult, IntoReply,
    };

    // Routing customisation
    pub use courier_framework::{
        HelpSynthesizer, HelpTexts, Router, RouterConfig, RouterHooks, UnprefixedPolicy,
        fallback_fn,
    };

    // Transport seams and message model
    pub use courier_core::{
        BoxError, ConversationKind, Dispatcher, IncomingMessage, ReplyTarget, Transport,
        TransportError, TransportResult,
    };
}
