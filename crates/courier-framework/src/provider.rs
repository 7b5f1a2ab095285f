//! Command providers.
//!
//! A [`CommandProvider`] is a capability implemented by each plugin that
//! contributes commands. The host enumerates its providers and hands them to
//! [`CommandRegistry::register_provider`](crate::CommandRegistry::register_provider),
//! so discovery is an explicit, deterministic list rather than reflection.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! struct Uptime {
//!     started: Instant,
//! }
//!
//! impl CommandProvider for Uptime {
//!     fn name(&self) -> &str {
//!         "uptime"
//!     }
//!
//!     fn commands(self: Arc<Self>) -> Vec<CommandSpec> {
//!         let this = Arc::clone(&self);
//!         vec![CommandSpec::new("uptime", move |_msg, _args| {
//!             let this = Arc::clone(&this);
//!             async move { format!("up {}s", this.started.elapsed().as_secs()) }
//!         })]
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::command::CommandSpec;

/// A plugin that contributes commands to the registry.
///
/// `commands` receives the provider behind an `Arc` so that handlers can
/// capture shared provider state.
pub trait CommandProvider: Send + Sync + 'static {
    /// Name of the provider, used in logs.
    fn name(&self) -> &str;

    /// The commands this provider exposes, with unprefixed names.
    fn commands(self: Arc<Self>) -> Vec<CommandSpec>;
}
