//! Observability module
//!
//! Structured logging for configuration loading and the CLI.

pub mod logging;

pub use logging::{LogFormat, LogSettings, init_logging};
