//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use courier_framework::{DEFAULT_ERROR_REPLY, DEFAULT_TRIGGER, HelpTexts, RouterConfig, UnprefixedPolicy};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    /// Who the bot is.
    #[serde(default)]
    pub bot: BotConfig,

    /// Command parsing and routing options.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Fixed reply texts.
    #[serde(default)]
    pub replies: RepliesConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Message loop settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl CourierConfig {
    /// Router settings derived from this configuration.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            identity: self.bot.identity.clone(),
            display_name: self.bot.display_name.clone(),
            trigger: self.commands.trigger,
            unprefixed: self.commands.unprefixed,
            accept_own_messages: self.commands.accept_own_messages,
            error_reply: self.replies.error.clone(),
        }
    }

    /// Help texts derived from this configuration.
    pub fn help_texts(&self) -> HelpTexts {
        HelpTexts {
            description: self.bot.description.clone(),
            fallback_description: self.replies.help_fallback_description.clone(),
            tail: self.replies.help_tail.clone(),
            undefined: self.replies.help_undefined.clone(),
        }
    }
}

/// Bot identity settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// The bot's own account, e.g. `bot@example.org`.
    #[serde(default)]
    pub identity: String,

    /// Nickname used in group chats. Group messages are ignored without one.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Shown at the top of the help listing.
    #[serde(default)]
    pub description: Option<String>,
}

/// Command options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Prepended to every command name to form its key.
    #[serde(default)]
    pub prefix: String,

    /// Character that marks a command invocation.
    #[serde(default = "default_trigger")]
    pub trigger: char,

    /// What to do with direct messages that lack the trigger.
    #[serde(default)]
    pub unprefixed: UnprefixedPolicy,

    /// Route direct messages sent from the bot's own identity.
    #[serde(default)]
    pub accept_own_messages: bool,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            trigger: default_trigger(),
            unprefixed: UnprefixedPolicy::default(),
            accept_own_messages: false,
        }
    }
}

fn default_trigger() -> char {
    DEFAULT_TRIGGER
}

/// Reply texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepliesConfig {
    /// Sent when a command handler fails.
    #[serde(default = "default_error_reply")]
    pub error: String,

    /// Hint below the help listing; `{help}` becomes the help command key.
    #[serde(default = "default_help_tail")]
    pub help_tail: String,

    /// Reply to help for an unknown command.
    #[serde(default = "default_help_undefined")]
    pub help_undefined: String,

    /// Help banner used when the bot has no description.
    #[serde(default = "default_help_fallback_description")]
    pub help_fallback_description: String,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            error: default_error_reply(),
            help_tail: default_help_tail(),
            help_undefined: default_help_undefined(),
            help_fallback_description: default_help_fallback_description(),
        }
    }
}

fn default_error_reply() -> String {
    DEFAULT_ERROR_REPLY.to_string()
}

fn default_help_tail() -> String {
    HelpTexts::default().tail
}

fn default_help_undefined() -> String {
    HelpTexts::default().undefined
}

fn default_help_fallback_description() -> String {
    HelpTexts::default().fallback_description
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line output.
    #[default]
    Compact,
    /// Default `tracing-subscriber` output.
    Full,
    /// Multi-line, human friendly output.
    Pretty,
    /// Newline-delimited JSON.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Write to `logging.file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error). `RUST_LOG` wins over it.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `courier_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in each line.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Message loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the inbound message queue.
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inbound_buffer: default_inbound_buffer(),
        }
    }
}

fn default_inbound_buffer() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_config_mapping() {
        let mut config = CourierConfig::default();
        config.bot.identity = "bot@example.org".into();
        config.bot.display_name = Some("BotName".into());
        config.commands.trigger = '/';
        config.commands.unprefixed = UnprefixedPolicy::IgnoreRegistry;
        config.replies.error = "oops".into();

        let router = config.router_config();
        assert_eq!(router.identity, "bot@example.org");
        assert_eq!(router.display_name.as_deref(), Some("BotName"));
        assert_eq!(router.trigger, '/');
        assert_eq!(router.unprefixed, UnprefixedPolicy::IgnoreRegistry);
        assert!(!router.accept_own_messages);
        assert_eq!(router.error_reply, "oops");
    }

    #[test]
    fn test_default_replies_match_framework() {
        let config = CourierConfig::default();
        let texts = config.help_texts();
        let defaults = HelpTexts::default();
        assert_eq!(texts.tail, defaults.tail);
        assert_eq!(texts.undefined, defaults.undefined);
        assert_eq!(texts.fallback_description, defaults.fallback_description);
        assert_eq!(config.replies.error, DEFAULT_ERROR_REPLY);
        assert_eq!(config.commands.trigger, '!');
    }
}
