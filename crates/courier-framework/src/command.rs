//! Command definitions.
//!
//! A [`CommandSpec`] is the unit of registration: a name, a handler and the
//! metadata the router and the help synthesizer need.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_framework::CommandSpec;
//!
//! let spec = CommandSpec::new("uptime", |_msg, _args| async move { "up 3 days" })
//!     .doc("Shows how long the host has been running.")
//!     .threaded(true);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use courier_core::IncomingMessage;

use crate::handler::{BoxedHandler, CommandHandler, IntoReply, into_handler};

/// Summary text for commands without documentation.
pub const UNDOCUMENTED: &str = "(undocumented)";

/// A named, invokable command with its metadata.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    /// Full lookup key (`prefix + name`), assigned by the registry.
    key: String,
    hidden: bool,
    admin: bool,
    threaded: bool,
    documentation: Option<String>,
    handler: BoxedHandler,
}

impl CommandSpec {
    /// Creates a command from an async function or closure.
    pub fn new<F, Fut, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<IncomingMessage>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Self::from_handler(name, into_handler(f))
    }

    /// Creates a command from an existing handler.
    pub fn from_handler(name: impl Into<String>, handler: BoxedHandler) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            hidden: false,
            admin: false,
            threaded: false,
            documentation: None,
            handler,
        }
    }

    /// Creates a command from a [`CommandHandler`] implementation.
    pub fn with_handler<H: CommandHandler>(name: impl Into<String>, handler: H) -> Self {
        Self::from_handler(name, Arc::new(handler))
    }

    /// Excludes the command from the help listing. It stays invokable.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Marks the command as privileged. The router does not enforce this.
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Runs the handler on its own task instead of the delivery loop.
    ///
    /// Replies of threaded commands may arrive out of order relative to
    /// replies for messages received later.
    pub fn threaded(mut self, threaded: bool) -> Self {
        self.threaded = threaded;
        self
    }

    /// Sets the documentation shown by `help`.
    ///
    /// The first line is the summary in the command listing; the full text
    /// is shown by `help <command>`.
    pub fn doc(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// The command name without prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full lookup key.
    ///
    /// Equal to the name until the command is registered, then `prefix + name`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    /// The raw documentation text, if any.
    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// First line of the trimmed documentation, or [`UNDOCUMENTED`].
    pub fn summary(&self) -> &str {
        self.documentation
            .as_deref()
            .map(str::trim)
            .filter(|doc| !doc.is_empty())
            .and_then(|doc| doc.lines().next())
            .unwrap_or(UNDOCUMENTED)
    }

    /// The full trimmed documentation, or [`UNDOCUMENTED`].
    pub fn details(&self) -> &str {
        self.documentation
            .as_deref()
            .map(str::trim)
            .filter(|doc| !doc.is_empty())
            .unwrap_or(UNDOCUMENTED)
    }

    /// The handler.
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = key;
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("key", &self.key)
            .field("hidden", &self.hidden)
            .field("admin", &self.admin)
            .field("threaded", &self.threaded)
            .finish_non_exhaustive()
    }
}
