//! Message router.
//!
//! The [`Router`] decides what to do with each incoming message, runs the
//! matching command and sends the reply back through the transport.
//!
//! # Routing rules
//!
//! Direct messages:
//! 1. Messages from the bot's own identity are ignored (identities are
//!    compared without their `/resource` part).
//! 2. The body is parsed with the trigger character. A body that is not a
//!    command is handled according to the [`UnprefixedPolicy`].
//! 3. A registered key invokes its handler; anything else goes to the
//!    [`RouterHooks::unknown_command`] fallback.
//!
//! Group messages are only considered when the bot's display name appears
//! in the body and the sender is not the bot itself. They never run
//! structured commands: they always go to the fallback with empty arguments.
//!
//! # Failure containment
//!
//! A handler that returns an error or panics never takes the router down.
//! The fault is logged with the message context and the user receives the
//! configured error reply.
//!
//! # Threaded commands
//!
//! Commands marked [`threaded`](crate::CommandSpec::threaded) run on their
//! own tokio task. [`Dispatcher::dispatch`] returns as soon as the task is
//! spawned, so replies of threaded commands may be delivered after replies to
//! messages that arrived later. Unthreaded handlers run on the caller's task:
//! one that never completes blocks the delivery loop, as there is no timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, debug_span, error, warn};

use courier_core::{
    BoxedTransport, ConversationKind, Dispatcher, IncomingMessage, ReplyTarget, bare_identity,
};

use crate::command::CommandSpec;
use crate::error::HandlerFailure;
use crate::hooks::{DefaultHooks, RouterHooks};
use crate::parser::{DEFAULT_TRIGGER, ParsedCommand, parse};
use crate::registry::CommandRegistry;

/// Default reply sent when a command handler fails.
pub const DEFAULT_ERROR_REPLY: &str = "Sorry for your inconvenience. An unexpected error occurred.";

/// What the direct path does with a body that does not start with the
/// trigger character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnprefixedPolicy {
    /// Try the whole (lower-cased) body as a command key anyway.
    #[default]
    Lookup,
    /// Skip the registry and hand the message to the unknown-command hook,
    /// with the body as arguments.
    IgnoreRegistry,
}

/// Router settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The bot's own identity; direct messages from it are ignored.
    pub identity: String,
    /// The bot's nickname in group chats. Without one, group messages are
    /// ignored.
    pub display_name: Option<String>,
    /// Character marking a command invocation.
    pub trigger: char,
    /// Handling of direct messages without the trigger character.
    pub unprefixed: UnprefixedPolicy,
    /// Route direct messages sent from the bot's own identity.
    pub accept_own_messages: bool,
    /// Reply sent when a handler fails.
    pub error_reply: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            display_name: None,
            trigger: DEFAULT_TRIGGER,
            unprefixed: UnprefixedPolicy::default(),
            accept_own_messages: false,
            error_reply: DEFAULT_ERROR_REPLY.to_string(),
        }
    }
}

impl RouterConfig {
    /// Creates a config for the given bot identity with default settings.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Self::default()
        }
    }

    /// Sets the bot's group-chat nickname.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the trigger character.
    pub fn trigger(mut self, trigger: char) -> Self {
        self.trigger = trigger;
        self
    }

    /// Sets the unprefixed-message policy.
    pub fn unprefixed(mut self, policy: UnprefixedPolicy) -> Self {
        self.unprefixed = policy;
        self
    }

    /// Sets whether the bot's own direct messages are routed.
    pub fn accept_own_messages(mut self, accept: bool) -> Self {
        self.accept_own_messages = accept;
        self
    }

    /// Sets the reply used when a handler fails.
    pub fn error_reply(mut self, reply: impl Into<String>) -> Self {
        self.error_reply = reply.into();
        self
    }
}

/// Why a message was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sent by the bot itself.
    OwnMessage,
    /// A group message that does not mention the bot.
    NotMentioned,
    /// A group message while the bot has no display name.
    NoDisplayName,
}

/// The routing decision for one message.
#[derive(Debug, Clone)]
pub enum Route {
    /// Send nothing.
    Ignore(IgnoreReason),
    /// Run a registered command.
    Invoke {
        command: Arc<CommandSpec>,
        args: String,
    },
    /// Hand the message to the unknown-command hook.
    Unknown { command: String, args: String },
}

/// Routes incoming messages to registered commands.
pub struct Router {
    config: RouterConfig,
    registry: Arc<CommandRegistry>,
    hooks: Arc<dyn RouterHooks>,
    transport: BoxedTransport,
    /// Log collaborator; every routed message is processed under it.
    log: Dispatch,
}

impl Router {
    /// Creates a router with default hooks.
    ///
    /// Log output goes to the subscriber that is current at construction
    /// time; see [`with_log`](Self::with_log).
    pub fn new(config: RouterConfig, registry: Arc<CommandRegistry>, transport: BoxedTransport) -> Self {
        Self {
            config,
            registry,
            hooks: Arc::new(DefaultHooks),
            transport,
            log: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Replaces the router hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn RouterHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sends routing diagnostics to `log`.
    pub fn with_log(mut self, log: Dispatch) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn hooks(&self) -> &Arc<dyn RouterHooks> {
        &self.hooks
    }

    /// Decides how to handle `msg` without running anything.
    pub fn resolve(&self, msg: &IncomingMessage) -> Route {
        match msg.kind() {
            ConversationKind::Direct => self.resolve_direct(msg),
            ConversationKind::Group => self.resolve_group(msg),
        }
    }

    fn resolve_direct(&self, msg: &IncomingMessage) -> Route {
        if !self.config.accept_own_messages
            && bare_identity(msg.sender()) == bare_identity(&self.config.identity)
        {
            return Route::Ignore(IgnoreReason::OwnMessage);
        }

        let (key, args) = match parse(msg.body(), self.config.trigger) {
            ParsedCommand::Command { name, args } => (name, args),
            ParsedCommand::NotACommand => match self.config.unprefixed {
                UnprefixedPolicy::Lookup => (msg.body().to_lowercase(), String::new()),
                UnprefixedPolicy::IgnoreRegistry => {
                    return Route::Unknown {
                        command: String::new(),
                        args: msg.body().to_string(),
                    };
                }
            },
        };
        debug!(command = %key, "Parsed direct message");

        match self.registry.lookup(&key) {
            Some(command) => Route::Invoke { command, args },
            None => Route::Unknown { command: key, args },
        }
    }

    fn resolve_group(&self, msg: &IncomingMessage) -> Route {
        let Some(nick) = self
            .config
            .display_name
            .as_deref()
            .filter(|nick| !nick.is_empty())
        else {
            return Route::Ignore(IgnoreReason::NoDisplayName);
        };

        if msg.display_name() == Some(nick) {
            return Route::Ignore(IgnoreReason::OwnMessage);
        }
        if !msg.body().contains(nick) {
            return Route::Ignore(IgnoreReason::NotMentioned);
        }

        Route::Unknown {
            command: String::new(),
            args: String::new(),
        }
    }

    /// Routes `msg` and returns the reply, without sending it.
    ///
    /// Threaded commands still run on their own task; this call waits for it.
    pub async fn route(&self, msg: IncomingMessage) -> Option<String> {
        let span = message_span(&msg);
        let msg = Arc::new(msg);
        async {
            let route = self.resolve(&msg);
            self.execute(route, &msg).await
        }
        .instrument(span)
        .with_subscriber(self.log.clone())
        .await
    }

    async fn execute(&self, route: Route, msg: &Arc<IncomingMessage>) -> Option<String> {
        match route {
            Route::Ignore(reason) => {
                debug!(?reason, "Ignoring message");
                None
            }
            Route::Invoke { command, args } if command.is_threaded() => {
                let key = command.key().to_string();
                let task = invoke(command, Arc::clone(msg), args, self.config.error_reply.clone());
                match tokio::spawn(task.in_current_span().with_current_subscriber()).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        let failure = if e.is_panic() {
                            HandlerFailure::from_panic(e.into_panic())
                        } else {
                            HandlerFailure::Aborted(e.to_string())
                        };
                        error!(
                            command = %key,
                            sender = %msg.sender(),
                            body = %msg.body(),
                            error = %failure,
                            "Threaded command task did not complete"
                        );
                        Some(self.config.error_reply.clone())
                    }
                }
            }
            Route::Invoke { command, args } => {
                invoke(command, Arc::clone(msg), args, self.config.error_reply.clone()).await
            }
            Route::Unknown { command, args } => self.fallback(msg, &command, &args),
        }
    }

    fn fallback(&self, msg: &IncomingMessage, command: &str, args: &str) -> Option<String> {
        let hooks = Arc::clone(&self.hooks);
        match panic::catch_unwind(AssertUnwindSafe(|| hooks.unknown_command(msg, command, args))) {
            Ok(reply) => reply.filter(|r| !r.is_empty()),
            Err(payload) => {
                let failure = HandlerFailure::from_panic(payload);
                error!(
                    command = %command,
                    sender = %msg.sender(),
                    body = %msg.body(),
                    error = %failure,
                    "Unknown-command hook failed"
                );
                None
            }
        }
    }

    async fn dispatch_inner(&self, msg: Arc<IncomingMessage>) {
        let target = msg.reply_target();

        match self.resolve(&msg) {
            Route::Invoke { command, args } if command.is_threaded() => {
                debug!(command = %command.key(), "Spawning threaded command");
                let transport = Arc::clone(&self.transport);
                let error_reply = self.config.error_reply.clone();
                let task = async move {
                    let reply = invoke(command, msg, args, error_reply).await;
                    deliver(&transport, &target, reply).await;
                };
                tokio::spawn(task.in_current_span().with_current_subscriber());
            }
            route => {
                let reply = self.execute(route, &msg).await;
                deliver(&self.transport, &target, reply).await;
            }
        }
    }
}

#[async_trait]
impl Dispatcher for Router {
    async fn dispatch(&self, msg: IncomingMessage) {
        let span = message_span(&msg);
        self.dispatch_inner(Arc::new(msg))
            .instrument(span)
            .with_subscriber(self.log.clone())
            .await;
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn message_span(msg: &IncomingMessage) -> tracing::Span {
    debug_span!("route", kind = %msg.kind(), sender = %msg.sender())
}

/// Runs a command handler, containing errors and panics.
async fn invoke(
    command: Arc<CommandSpec>,
    msg: Arc<IncomingMessage>,
    args: String,
    error_reply: String,
) -> Option<String> {
    match run_handler(&command, Arc::clone(&msg), args).await {
        Ok(reply) => reply.filter(|r| !r.is_empty()),
        Err(failure) => {
            error!(
                command = %command.key(),
                sender = %msg.sender(),
                body = %msg.body(),
                error = %failure,
                "An error happened while processing a message"
            );
            Some(error_reply)
        }
    }
}

async fn run_handler(
    command: &CommandSpec,
    msg: Arc<IncomingMessage>,
    args: String,
) -> Result<Option<String>, HandlerFailure> {
    // The handler may panic while building its future, not only while polling it.
    let future = panic::catch_unwind(AssertUnwindSafe(|| command.handler().call(msg, args)))
        .map_err(HandlerFailure::from_panic)?;

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(e)) => Err(HandlerFailure::Error(e)),
        Err(payload) => Err(HandlerFailure::from_panic(payload)),
    }
}

async fn deliver(transport: &BoxedTransport, target: &ReplyTarget, reply: Option<String>) {
    let Some(text) = reply.filter(|r| !r.is_empty()) else {
        return;
    };
    if let Err(e) = transport.send_reply(target, &text).await {
        warn!(reply_target = %target, error = %e, "Failed to send reply");
    }
}
