//! Message parsing.
//!
//! Turns raw message text into a command name and an argument string:
//!
//! 1. Text that does not start with the trigger character is
//!    [`ParsedCommand::NotACommand`].
//! 2. Otherwise the text is split on the first space. Everything before it,
//!    minus the trigger, is the command name; everything after it is the
//!    argument string. Without a space the whole remainder is the name and
//!    the arguments are empty.
//! 3. The name is lower-cased.
//! 4. The argument string is passed through verbatim.
//!
//! ```rust
//! use courier_framework::parser::{ParsedCommand, parse};
//!
//! assert_eq!(
//!     parse("!Echo  hello ", '!'),
//!     ParsedCommand::command("echo", " hello "),
//! );
//! assert_eq!(parse("hello", '!'), ParsedCommand::NotACommand);
//! ```

/// The default trigger character.
pub const DEFAULT_TRIGGER: char = '!';

/// Result of parsing one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// The body does not start with the trigger character.
    NotACommand,
    /// A command invocation.
    Command {
        /// Lower-cased command name, without the trigger.
        name: String,
        /// Verbatim text after the first space.
        args: String,
    },
}

impl ParsedCommand {
    /// Creates a [`ParsedCommand::Command`].
    pub fn command(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self::Command {
            name: name.into(),
            args: args.into(),
        }
    }

    /// Returns `true` for [`ParsedCommand::Command`].
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }

    /// The command name, if this is a command.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Command { name, .. } => Some(name),
            Self::NotACommand => None,
        }
    }

    /// The argument string, if this is a command.
    pub fn args(&self) -> Option<&str> {
        match self {
            Self::Command { args, .. } => Some(args),
            Self::NotACommand => None,
        }
    }
}

/// Parses `body` using `trigger` as the command marker.
///
/// A body consisting of the trigger alone yields an empty command name,
/// which simply misses the registry. An empty body is `NotACommand`, not an
/// empty name; the router's unprefixed policy then turns it into the key `""`
/// or sends it to the unknown-command hook, so both reach the same place.
pub fn parse(body: &str, trigger: char) -> ParsedCommand {
    let Some(rest) = body.strip_prefix(trigger) else {
        return ParsedCommand::NotACommand;
    };

    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
    ParsedCommand::command(name.to_lowercase(), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_only() {
        assert_eq!(parse("!uptime", '!'), ParsedCommand::command("uptime", ""));
    }

    #[test]
    fn test_name_and_args() {
        assert_eq!(
            parse("!echo hello world", '!'),
            ParsedCommand::command("echo", "hello world")
        );
    }

    #[test]
    fn test_args_are_verbatim() {
        assert_eq!(
            parse("!echo   spaced  out ", '!'),
            ParsedCommand::command("echo", "  spaced  out ")
        );
        assert_eq!(parse("!echo ", '!'), ParsedCommand::command("echo", ""));
    }

    #[test]
    fn test_case_insensitive_name() {
        assert_eq!(parse("!HELP", '!'), parse("!help", '!'));
        // only the name is folded
        assert_eq!(parse("!Say Hi", '!'), ParsedCommand::command("say", "Hi"));
    }

    #[test]
    fn test_not_a_command() {
        assert_eq!(parse("uptime", '!'), ParsedCommand::NotACommand);
        assert_eq!(parse(" !uptime", '!'), ParsedCommand::NotACommand);
        assert_eq!(parse("", '!'), ParsedCommand::NotACommand);
    }

    #[test]
    fn test_trigger_alone_is_empty_name() {
        assert_eq!(parse("!", '!'), ParsedCommand::command("", ""));
        assert_eq!(parse("! x", '!'), ParsedCommand::command("", "x"));
    }

    #[test]
    fn test_custom_trigger() {
        assert_eq!(parse("/ping", '/'), ParsedCommand::command("ping", ""));
        assert_eq!(parse("!ping", '/'), ParsedCommand::NotACommand);
    }

    #[test]
    fn test_reparse_is_stable() {
        let cases = [("echo", "a b  c"), ("roll", "2d6"), ("x", " lead")];
        for (name, args) in cases {
            let first = ParsedCommand::command(name, args);
            let rebuilt = format!("!{name} {args}");
            assert_eq!(parse(&rebuilt, '!'), first, "reparse of {rebuilt:?}");
        }
    }

    #[test]
    fn test_accessors() {
        let parsed = parse("!a b", '!');
        assert!(parsed.is_command());
        assert_eq!(parsed.name(), Some("a"));
        assert_eq!(parsed.args(), Some("b"));
        assert_eq!(ParsedCommand::NotACommand.name(), None);
    }
}
