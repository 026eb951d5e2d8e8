//! Logging initialization for `ia-downloader`.
//!
//! Diagnostics go to stderr through `tracing`, so stdout stays reserved for
//! command output such as `show` and `validate --format json`.
//! `IA_DOWNLOADER_LOG_LEVEL` overrides the `-v` flags with a full
//! `EnvFilter` directive.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, ColorChoice};

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "IA_DOWNLOADER_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Logging settings resolved from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Output format.
    pub format: LogFormat,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Color preference.
    pub color: ColorChoice,
}

impl LogSettings {
    /// Collects the logging-related global flags.
    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.log_format,
            verbosity: cli.verbose,
            color: cli.color,
        }
    }

    /// Default filter directive for the verbosity level (saturates at trace).
    #[must_use]
    pub const fn directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether human output should carry ANSI colors.
    ///
    /// `Auto` colors only an interactive stderr and honours `NO_COLOR`.
    #[must_use]
    pub fn use_ansi(&self) -> bool {
        match self.color {
            ColorChoice::Auto => {
                std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// Installs the global tracing subscriber.
///
/// Module targets are shown from `-vv` upward. Uses `try_init()`, so a
/// second call is a no-op.
pub fn init_logging(settings: LogSettings) {
    let show_target = settings.verbosity >= 2;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_target(show_target)
        .with_writer(std::io::stderr);

    let _ = match settings.format {
        LogFormat::Human => builder.with_ansi(settings.use_ansi()).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(verbosity: u8, color: ColorChoice) -> LogSettings {
        LogSettings {
            format: LogFormat::Human,
            verbosity,
            color,
        }
    }

    #[test]
    fn log_format_default_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn verbosity_directives() {
        let expected = [(0, "warn"), (1, "info"), (2, "debug"), (3, "trace"), (255, "trace")];
        for (verbosity, directive) in expected {
            assert_eq!(settings(verbosity, ColorChoice::Never).directive(), directive);
        }
    }

    #[test]
    fn explicit_color_choices() {
        assert!(settings(0, ColorChoice::Always).use_ansi());
        assert!(!settings(0, ColorChoice::Never).use_ansi());
    }

    #[test]
    fn settings_from_cli() {
        let cli = Cli::try_parse_from([
            "ia-downloader",
            "-vv",
            "--log-format",
            "json",
            "--color",
            "never",
            "validate",
        ])
        .unwrap();
        let settings = LogSettings::from_cli(&cli);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.verbosity, 2);
        assert_eq!(settings.color, ColorChoice::Never);
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(settings(0, ColorChoice::Auto));
        init_logging(LogSettings {
            format: LogFormat::Json,
            verbosity: 3,
            color: ColorChoice::Never,
        });
    }
}
