//! Courier Runtime - configuration, logging and the message loop.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`) and validation
//! - Logging setup on `tracing-subscriber`, driven by the `[logging]` section
//! - The runtime (`CourierRuntime`), which owns the command registry and
//!   router and feeds them from an inbound queue
//!
//! ```ignore
//! use courier_runtime::CourierRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder().build(ConsoleTransport::new())?;
//!
//!     runtime.register_provider(Arc::new(UptimeCommands::new()));
//!     tokio::spawn(read_console(runtime.inbound()));
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LogFormat, LogOutput, LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::init_from_config;
pub use runtime::{CourierRuntime, InboundSender, RuntimeBuilder};
