//! Configuration module for the Courier runtime.
//!
//! Layered loading of the bot identity, command options, reply texts,
//! logging and runtime settings, plus validation of the result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    BotConfig, CommandsConfig, CourierConfig, LogFormat, LogOutput, LoggingConfig, RepliesConfig,
    RuntimeConfig, SpanEventConfig,
};
pub use validation::validate_config;
