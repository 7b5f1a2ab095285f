//! Overridable router hooks.
//!
//! The [`RouterHooks`] trait collects the behaviour a bot may customise
//! without touching the routing rules: what to answer when no command
//! matches, extra text around the help listing, and callbacks when the
//! runtime's message loop starts and stops. Every method has a default, so
//! implementors override only what they need.
//!
//! ```rust,ignore
//! struct Polite;
//!
//! impl RouterHooks for Polite {
//!     fn unknown_command(&self, msg: &IncomingMessage, _command: &str, _args: &str) -> Option<String> {
//!         msg.is_group().then(|| "Ask me in private".to_string())
//!     }
//! }
//! ```

use courier_core::IncomingMessage;

/// Customisation points used by the router and the help synthesizer.
pub trait RouterHooks: Send + Sync + 'static {
    /// Called when a message does not match a registered command, and for
    /// every group message that mentions the bot (with empty `command` and
    /// `args`).
    ///
    /// A non-empty return value is sent as the reply. The default is silence.
    fn unknown_command(&self, msg: &IncomingMessage, command: &str, args: &str) -> Option<String> {
        let _ = (msg, command, args);
        None
    }

    /// Text placed before the help output.
    fn top_of_help(&self) -> String {
        String::new()
    }

    /// Text placed after the help output.
    fn bottom_of_help(&self) -> String {
        String::new()
    }

    /// Called when the message loop starts, before the first message.
    fn on_start(&self) {}

    /// Called when the message loop ends, however it ends.
    ///
    /// Threaded commands may still be running.
    fn on_shutdown(&self) {}
}

/// Hooks with all default behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl RouterHooks for DefaultHooks {}

/// Hooks that answer unknown commands with a closure.
pub struct FallbackFn<F>(F);

impl<F> RouterHooks for FallbackFn<F>
where
    F: Fn(&IncomingMessage, &str, &str) -> Option<String> + Send + Sync + 'static,
{
    fn unknown_command(&self, msg: &IncomingMessage, command: &str, args: &str) -> Option<String> {
        (self.0)(msg, command, args)
    }
}

/// Builds hooks whose unknown-command fallback is `f`.
pub fn fallback_fn<F>(f: F) -> FallbackFn<F>
where
    F: Fn(&IncomingMessage, &str, &str) -> Option<String> + Send + Sync + 'static,
{
    FallbackFn(f)
}
