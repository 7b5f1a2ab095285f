//! Command registry.
//!
//! The [`CommandRegistry`] maps command keys (`prefix + name`) to
//! [`CommandSpec`]s. It is filled once at start-up, but plugins may add or
//! remove commands at any time while messages are being routed.
//!
//! Entries are stored as `Arc<CommandSpec>` behind a reader-writer lock: a
//! lookup clones one `Arc` under a short read lock, and a writer swaps whole
//! entries, so readers never observe a half-built command.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Dispatch, info, warn};

use crate::command::CommandSpec;
use crate::provider::CommandProvider;

/// Concurrency-safe map of command key to [`CommandSpec`].
pub struct CommandRegistry {
    prefix: String,
    commands: RwLock<HashMap<String, Arc<CommandSpec>>>,
    /// Log collaborator for registration events.
    log: Dispatch,
}

impl CommandRegistry {
    /// Creates an empty registry whose keys are `prefix + name`.
    ///
    /// Registration events go to the subscriber that is current at
    /// construction time; see [`with_log`](Self::with_log).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: RwLock::new(HashMap::new()),
            log: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Sends registration events to `log` instead of the current subscriber.
    pub fn with_log(mut self, log: Dispatch) -> Self {
        self.log = log;
        self
    }

    /// The configured command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds the lookup key for a command name.
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Registers a command under `prefix + spec.name()`.
    ///
    /// An existing command with the same key is replaced (last registration
    /// wins) and returned.
    pub fn register(&self, mut spec: CommandSpec) -> Option<Arc<CommandSpec>> {
        let key = self.key_for(spec.name());
        spec.set_key(key.clone());
        let spec = Arc::new(spec);

        let previous = self.commands.write().insert(key.clone(), spec);

        tracing::dispatcher::with_default(&self.log, || {
            if previous.is_some() {
                warn!(command = %key, "Command registered twice, last registration wins");
            } else {
                info!(command = %key, "Registered command");
            }
            if key.chars().any(char::is_uppercase) {
                warn!(
                    command = %key,
                    "Command key contains uppercase characters; parsed command names are \
                     lower-cased, so it can only be reached through help"
                );
            }
        });

        previous
    }

    /// Registers every command a provider exposes.
    ///
    /// Returns the number of commands registered.
    pub fn register_provider<P>(&self, provider: Arc<P>) -> usize
    where
        P: CommandProvider + ?Sized,
    {
        let name = provider.name().to_string();
        let specs = provider.commands();
        let count = specs.len();
        for spec in specs {
            self.register(spec);
        }
        tracing::dispatcher::with_default(&self.log, || {
            info!(provider = %name, count, "Registered command provider");
        });
        count
    }

    /// Looks up a command by its full key.
    pub fn lookup(&self, key: &str) -> Option<Arc<CommandSpec>> {
        self.commands.read().get(key).cloned()
    }

    /// Returns `true` if a command is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.commands.read().contains_key(key)
    }

    /// Removes the command registered under `key`.
    pub fn remove(&self, key: &str) -> Option<Arc<CommandSpec>> {
        let removed = self.commands.write().remove(key);
        if removed.is_some() {
            tracing::dispatcher::with_default(&self.log, || {
                info!(command = %key, "Unregistered command");
            });
        }
        removed
    }

    /// Returns a snapshot of all registered commands, in no particular order.
    pub fn list(&self) -> Vec<Arc<CommandSpec>> {
        self.commands.read().values().cloned().collect()
    }

    /// Returns all registered keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.commands.read().keys().cloned().collect()
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("command_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::into_handler;
    use courier_core::IncomingMessage;

    fn replying(name: &str, reply: &'static str) -> CommandSpec {
        CommandSpec::new(name, move |_msg, _args| async move { reply })
    }

    async fn invoke(spec: &CommandSpec) -> Option<String> {
        let msg = Arc::new(IncomingMessage::direct("alice@example.org", "!x"));
        spec.handler().call(msg, String::new()).await.unwrap()
    }

    #[test]
    fn test_register_applies_prefix() {
        let registry = CommandRegistry::new("bot_");
        registry.register(replying("uptime", "up"));

        let spec = registry.lookup("bot_uptime").unwrap();
        assert_eq!(spec.key(), "bot_uptime");
        assert_eq!(spec.name(), "uptime");
        assert!(registry.lookup("uptime").is_none());
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let registry = CommandRegistry::default();
        assert!(registry.lookup("nope").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = CommandRegistry::default();
        assert!(registry.register(replying("greet", "first")).is_none());
        let previous = registry.register(replying("greet", "second"));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        let spec = registry.lookup("greet").unwrap();
        assert_eq!(invoke(&spec).await.as_deref(), Some("second"));
    }

    #[test]
    fn test_remove() {
        let registry = CommandRegistry::default();
        registry.register(replying("a", "a"));
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(!registry.contains("a"));
    }

    #[test]
    fn test_list_and_keys() {
        let registry = CommandRegistry::new("!");
        registry.register(replying("a", "a"));
        registry.register(replying("b", "b").hidden(true));

        let mut keys = registry.keys();
        keys.sort();
        assert_eq!(keys, vec!["!a", "!b"]);
        assert_eq!(registry.list().len(), 2);
    }

    struct Greeter;

    impl CommandProvider for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn commands(self: Arc<Self>) -> Vec<CommandSpec> {
            vec![
                CommandSpec::from_handler("hello", into_handler(|_m, _a| async { "hi" })),
                CommandSpec::from_handler("bye", into_handler(|_m, _a| async { "bye" })),
            ]
        }
    }

    #[test]
    fn test_register_provider() {
        let registry = CommandRegistry::new("!");
        assert_eq!(registry.register_provider(Arc::new(Greeter)), 2);
        assert!(registry.contains("!hello"));
        assert!(registry.contains("!bye"));
    }

    #[test]
    fn test_concurrent_register_and_lookup() {
        let registry = Arc::new(CommandRegistry::default());
        registry.register(replying("stable", "ok"));

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        registry.register(replying(&format!("cmd{t}_{i}"), "x"));
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let spec = registry.lookup("stable").unwrap();
                        assert_eq!(spec.key(), "stable");
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 401);
    }
}
