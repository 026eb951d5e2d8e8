//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check against the configured limit
//! 2. Read raw UTF-8 text, strip a leading BOM
//! 3. YAML parsing, merge keys (`<<`) expanded
//! 4. Raw-input validation (cross-field rules, warnings)
//! 5. Typed construction
//! 6. Strict mode promotion of warnings
//! 7. Freeze with `Arc`

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::schema::{ConfigArgs, INPUT_ORIGIN};
use crate::config::validation::{Validator, value_kind};
use crate::error::{ConfigError, Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Default upper bound on configuration file size (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Treat warnings as errors.
    pub strict: bool,

    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_config_size: env_or("IA_DOWNLOADER_MAX_CONFIG_SIZE", DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<ConfigArgs>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Field the warning refers to.
    pub location: Option<String>,
}

impl From<ValidationIssue> for LoadWarning {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            message: issue.message,
            location: (!issue.path.is_empty()).then_some(issue.path),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file and returns the frozen configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable, or over the size limit
    /// - YAML parsing fails or the document is not a mapping
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        tracing::debug!(path = %path.display(), "loading configuration");

        let metadata = std::fs::metadata(path).map_err(|source| ConfigError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                ConfigError::ParseError {
                    path: path.to_path_buf(),
                    line: None,
                    message: "content is not valid UTF-8".to_string(),
                }
            } else {
                ConfigError::FileAccess {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        self.load_content(&content, path)
    }

    /// Loads a configuration from YAML text already in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn load_from_str(&self, content: &str) -> Result<LoadResult, ConfigError> {
        self.load_content(content, Path::new(INPUT_ORIGIN))
    }

    fn load_content(&self, content: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let raw = parse_mapping(content, path)?;
        let origin = path.display().to_string();

        let report = Validator::new().validate(&raw);
        if report.has_errors() {
            return Err(ConfigError::ValidationError {
                origin,
                errors: report.errors,
            });
        }

        let config = ConfigArgs::coerce(&raw).map_err(|errors| ConfigError::ValidationError {
            origin: origin.clone(),
            errors,
        })?;

        if self.options.strict && !report.warnings.is_empty() {
            let errors = report
                .warnings
                .into_iter()
                .map(|issue| ValidationIssue {
                    severity: Severity::Error,
                    ..issue
                })
                .collect();
            return Err(ConfigError::ValidationError { origin, errors });
        }

        tracing::debug!(
            path = %path.display(),
            identifiers = config.identifiers.len(),
            command = ?config.command,
            warnings = report.warnings.len(),
            "configuration loaded"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            warnings: report.warnings.into_iter().map(LoadWarning::from).collect(),
        })
    }
}

/// Parses YAML text into the top-level mapping.
fn parse_mapping(content: &str, path: &Path) -> Result<Mapping, ConfigError> {
    let parse_error = |e: serde_yaml::Error| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    };

    let mut root: Value = serde_yaml::from_str(content).map_err(parse_error)?;
    root.apply_merge().map_err(parse_error)?;

    match root {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: "Configuration file is empty".to_string(),
        }),
        other => Err(ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: format!("expected a mapping of settings, got {}", value_kind(&other)),
        }),
    }
}

/// Resolves the path to load: explicit argument, or the default location.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(
        || PathBuf::from(crate::config::schema::DEFAULT_CONFIG_PATH),
        Path::to_path_buf,
    )
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
