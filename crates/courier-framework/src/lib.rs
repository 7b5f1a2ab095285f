//! # Courier Framework
//!
//! Command dispatching on top of the core message types.
//!
//! This layer provides:
//! - Command specs and handlers with closure-based registration
//! - A thread-safe command registry fed directly or by providers
//! - Trigger-based message parsing
//! - The router, which applies the direct and group routing rules, contains
//!   handler failures and delivers replies
//! - Help text synthesized from the registry
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(CommandRegistry::default());
//! registry.register(
//!     CommandSpec::new("uptime", |_msg, _args| async move { "up 3 days" })
//!         .doc("Shows how long the host has been running."),
//! );
//!
//! let router = Router::new(RouterConfig::new("bot@example.org"), registry, transport);
//! router.dispatch(IncomingMessage::direct("alice@example.org", "!uptime")).await;
//! ```

pub mod command;
pub mod error;
pub mod handler;
pub mod help;
pub mod hooks;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod router;

pub use command::{CommandSpec, UNDOCUMENTED};
pub use error::HandlerFailure;
pub use handler::{BoxedHandler, CommandHandler, HandlerFn, HandlerResult, IntoReply, into_handler};
pub use help::{HELP_COMMAND, HelpSynthesizer, HelpTexts};
pub use hooks::{DefaultHooks, FallbackFn, RouterHooks, fallback_fn};
pub use parser::{DEFAULT_TRIGGER, ParsedCommand, parse};
pub use provider::CommandProvider;
pub use registry::CommandRegistry;
pub use router::{
    DEFAULT_ERROR_REPLY, IgnoreReason, Route, Router, RouterConfig, UnprefixedPolicy,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::command::CommandSpec;
    pub use super::help::HelpSynthesizer;
    pub use super::hooks::{RouterHooks, fallback_fn};
    pub use super::provider::CommandProvider;
    pub use super::registry::CommandRegistry;
    pub use super::router::{Router, RouterConfig, UnprefixedPolicy};
}
