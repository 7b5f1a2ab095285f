//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CommandsConfig, CourierConfig, LogOutput, LoggingConfig};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    if config.bot.identity.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.identity"));
    }

    validate_commands_config(&config.commands)?;
    validate_logging_config(&config.logging)?;

    if config.runtime.inbound_buffer == 0 {
        return Err(ConfigError::validation(
            "Inbound buffer must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_commands_config(commands: &CommandsConfig) -> ConfigResult<()> {
    if commands.trigger.is_whitespace() {
        return Err(ConfigError::validation(
            "Trigger character cannot be whitespace",
        ));
    }

    if commands.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    validate_log_level(&logging.level)?;

    for (module, level) in &logging.filters {
        if module.is_empty() {
            return Err(ConfigError::validation("Log filter module cannot be empty"));
        }
        validate_log_level(level)?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_log_level(level: &str) -> ConfigResult<()> {
    if !VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(ConfigError::validation(format!(
            "Invalid log level: {level}. Valid values are: {VALID_LOG_LEVELS:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CourierConfig {
        let mut config = CourierConfig::default();
        config.bot.identity = "bot@example.org".to_string();
        config
    }

    #[test]
    fn test_validate_minimal_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_missing_identity() {
        let result = validate_config(&CourierConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { field }) if field == "bot.identity"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = valid();
        config.logging.level = "invalid".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());

        let mut config = valid();
        config
            .logging
            .filters
            .insert("courier_framework".to_string(), "loud".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_trigger_and_prefix() {
        let mut config = valid();
        config.commands.trigger = ' ';
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.commands.prefix = "my bot_".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.commands.prefix = "bot_".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_inbound_buffer() {
        let mut config = valid();
        config.runtime.inbound_buffer = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
        config.logging.file_path = Some("courier.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
