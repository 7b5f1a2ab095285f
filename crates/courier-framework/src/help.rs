//! Help synthesizer.
//!
//! Builds the `help` command's output from the registry. Without an argument
//! it lists every visible command with the first line of its documentation;
//! with an argument it shows that command's full documentation.
//!
//! The listing is sorted by key and looks like:
//!
//! ```text
//! A friendly bot.
//!
//! echo: Repeats what you say.
//! uptime: Shows how long the host has been running.
//!
//! Type help <command name> to get more info about that specific command.
//! ```

use std::sync::{Arc, Weak};

use crate::command::CommandSpec;
use crate::hooks::RouterHooks;
use crate::registry::CommandRegistry;

/// Name of the built-in help command.
pub const HELP_COMMAND: &str = "help";

/// Configurable texts used by the help synthesizer.
#[derive(Debug, Clone)]
pub struct HelpTexts {
    /// Banner shown above the listing, usually the bot's own description.
    pub description: Option<String>,
    /// Banner used when `description` is absent or empty.
    pub fallback_description: String,
    /// Hint shown below the listing; `{help}` is replaced by the help key.
    pub tail: String,
    /// Reply when the requested command does not exist.
    pub undefined: String,
}

impl Default for HelpTexts {
    fn default() -> Self {
        Self {
            description: None,
            fallback_description: "Available commands:".to_string(),
            tail: "Type {help} <command name> to get more info about that specific command."
                .to_string(),
            undefined: "That command is not defined.".to_string(),
        }
    }
}

/// Produces help text from a [`CommandRegistry`].
///
/// The synthesizer holds the registry weakly: it is registered *into* that
/// registry as the `help` command, and a strong reference would form a cycle.
pub struct HelpSynthesizer {
    registry: Weak<CommandRegistry>,
    prefix: String,
    hooks: Arc<dyn RouterHooks>,
    texts: HelpTexts,
}

impl HelpSynthesizer {
    /// Creates a synthesizer for `registry`, using `hooks` for the text
    /// around the output.
    pub fn new(registry: &Arc<CommandRegistry>, hooks: Arc<dyn RouterHooks>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            prefix: registry.prefix().to_string(),
            hooks,
            texts: HelpTexts::default(),
        }
    }

    /// Replaces the help texts.
    pub fn with_texts(mut self, texts: HelpTexts) -> Self {
        self.texts = texts;
        self
    }

    /// The key of the help command itself.
    pub fn help_key(&self) -> String {
        format!("{}{}", self.prefix, HELP_COMMAND)
    }

    /// Builds the help output.
    ///
    /// `None` (or an empty string) produces the command listing, anything
    /// else is looked up as a command key, with the prefix added if the bare
    /// name is not registered.
    pub fn synthesize(&self, requested: Option<&str>) -> String {
        let (description, usage) = match requested.filter(|r| !r.is_empty()) {
            None => (self.description(), self.listing()),
            Some(requested) => (String::new(), self.details(requested)),
        };

        let top = self.hooks.top_of_help();
        let bottom = self.hooks.bottom_of_help();
        [top, description, usage, bottom]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Builds the `help` command spec bound to this synthesizer.
    pub fn command_spec(self: Arc<Self>) -> CommandSpec {
        CommandSpec::new(HELP_COMMAND, move |_msg, args: String| {
            let this = Arc::clone(&self);
            async move { this.synthesize(Some(&args)) }
        })
        .doc(
            "Returns a help string listing available options.\n\n\
             Automatically assigned to the \"help\" command.",
        )
    }

    /// Registers the help command into the synthesizer's registry.
    ///
    /// Does nothing if the registry has already been dropped.
    pub fn install(self: Arc<Self>) {
        if let Some(registry) = self.registry.upgrade() {
            registry.register(self.command_spec());
        }
    }

    fn description(&self) -> String {
        self.texts
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.texts.fallback_description.as_str())
            .to_string()
    }

    fn listing(&self) -> String {
        let help_key = self.help_key();
        let mut commands: Vec<_> = self
            .registry
            .upgrade()
            .map(|registry| registry.list())
            .unwrap_or_default()
            .into_iter()
            .filter(|spec| spec.key() != help_key && !spec.is_hidden())
            .collect();
        commands.sort_by(|a, b| a.key().cmp(b.key()));

        let lines = commands
            .iter()
            .map(|spec| format!("{}: {}", spec.key(), spec.summary()))
            .collect::<Vec<_>>()
            .join("\n");
        let tail = self.texts.tail.replace("{help}", &help_key);

        let body = [lines, tail]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("\n\n{body}")
    }

    fn details(&self, requested: &str) -> String {
        let Some(registry) = self.registry.upgrade() else {
            return self.texts.undefined.clone();
        };

        let spec = registry
            .lookup(requested)
            .or_else(|| registry.lookup(&format!("{}{}", self.prefix, requested)));
        match spec {
            Some(spec) => spec.details().to_string(),
            None => self.texts.undefined.clone(),
        }
    }
}
