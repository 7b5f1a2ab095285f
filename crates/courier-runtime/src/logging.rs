//! Logging setup driven by [`LoggingConfig`].
//!
//! The runtime calls [`init_from_config`] while it is built. Every routed
//! message runs inside a `route` span carrying its sender and conversation
//! kind, and `logging.span_events` makes that span's lifetime visible:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//! span_events = { new = true, close = true }
//!
//! [logging.filters]
//! courier_framework = "debug"
//! ```
//!
//! `RUST_LOG`, when set, replaces the configured base level. The per-module
//! filters are added on top either way.

use std::ffi::OsStr;
use std::path::Path;

use tracing::{Level, debug, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

const DEFAULT_LOG_FILE: &str = "courier.log";

/// Installs the global subscriber described by `config`.
///
/// Returns `false` and keeps the current subscriber if one is already
/// installed.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    match try_init_from_config(config) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Subscriber already installed, logging config not applied");
            false
        }
    }
}

/// Installs the global subscriber described by `config`, or reports why not.
pub fn try_init_from_config(config: &LoggingConfig) -> Result<(), TryInitError> {
    let writer = make_writer(config);
    let missing_file = writer.is_none();
    let writer = writer.unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout));

    tracing_subscriber::registry()
        .with(format_layer(config, writer))
        .with(env_filter(config))
        .try_init()?;

    if missing_file {
        warn!("File output requested but no file path configured, logging to stdout");
    }
    Ok(())
}

/// `None` when file output is selected without a path.
fn make_writer(config: &LoggingConfig) -> Option<BoxMakeWriter> {
    match (config.output, &config.file_path) {
        (LogOutput::Stdout, _) => Some(BoxMakeWriter::new(std::io::stdout)),
        (LogOutput::Stderr, _) => Some(BoxMakeWriter::new(std::io::stderr)),
        (LogOutput::File, Some(path)) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .unwrap_or_else(|| OsStr::new(DEFAULT_LOG_FILE));
            Some(BoxMakeWriter::new(tracing_appender::rolling::never(dir, name)))
        }
        (LogOutput::File, None) => None,
    }
}

fn format_layer(
    config: &LoggingConfig,
    writer: BoxMakeWriter,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events(&config.span_events))
        .with_thread_ids(config.thread_ids)
        .with_file(config.file_location)
        .with_line_number(config.file_location);

    match config.format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Full => layer.boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        #[cfg(feature = "json-log")]
        LogFormat::Json => layer.json().boxed(),
    }
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let base = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(base_level(config).as_str().to_lowercase()));

    // unparsable directives are skipped; validation reports them earlier
    filter_directives(config)
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(base, EnvFilter::add_directive)
}

/// The configured level, or `info` if it does not parse.
fn base_level(config: &LoggingConfig) -> Level {
    config.level.parse().unwrap_or(Level::INFO)
}

/// Per-module `target=level` directives, sorted by module.
fn filter_directives(config: &LoggingConfig) -> Vec<String> {
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort();
    filters
        .into_iter()
        .map(|(module, level)| format!("{module}={}", level.to_lowercase()))
        .collect()
}

fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |events, (_, event)| events | event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_events() {
        let mut config = SpanEventConfig::default();
        assert_eq!(span_events(&config), FmtSpan::NONE);

        config.new = true;
        config.close = true;
        assert_eq!(span_events(&config), FmtSpan::NEW | FmtSpan::CLOSE);

        config.enter = true;
        config.exit = true;
        assert_eq!(span_events(&config), FmtSpan::FULL);
    }

    #[test]
    fn test_filter_directives_are_sorted_and_lowercased() {
        let mut config = LoggingConfig::default();
        config
            .filters
            .insert("courier_runtime".to_string(), "WARN".to_string());
        config
            .filters
            .insert("courier_framework".to_string(), "trace".to_string());

        assert_eq!(
            filter_directives(&config),
            ["courier_framework=trace", "courier_runtime=warn"]
        );
    }

    #[test]
    fn test_base_level() {
        let mut config = LoggingConfig {
            level: "DEBUG".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(base_level(&config), Level::DEBUG);

        config.level = "chatty".to_string();
        assert_eq!(base_level(&config), Level::INFO);
    }

    #[test]
    fn test_file_output_needs_a_path() {
        let mut config = LoggingConfig {
            output: LogOutput::File,
            ..LoggingConfig::default()
        };
        assert!(make_writer(&config).is_none());

        config.output = LogOutput::Stderr;
        assert!(make_writer(&config).is_some());
    }

    #[test]
    fn test_second_init_keeps_existing_subscriber() {
        let config = LoggingConfig::default();
        // the first call may lose to another test that installed a subscriber
        init_from_config(&config);
        assert!(!init_from_config(&config));
        assert!(try_init_from_config(&config).is_err());
    }
}
