//! Configuration schema types
//!
//! `ConfigArgs` is the typed view of a downloader run. It is never built
//! field-by-field from user input directly: construction goes through the
//! raw-input [`Validator`] first and only then coerces each known key to its
//! declared type, so error messages refer to what the user actually wrote.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::loader::ConfigLoader;
use crate::config::validation::{Validator, value_kind, whole_number};
use crate::error::{ConfigError, ValidationIssue};

// ============================================================================
// Defaults
// ============================================================================

/// Path the file-loading factory reads when the caller names none.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Default folder for run logs.
pub const DEFAULT_LOG_FOLDER: &str = "ia_downloader_logs";

/// Default folder downloaded items are written to.
pub const DEFAULT_OUTPUT_FOLDER: &str = "output";

/// Default worker-thread count.
pub const DEFAULT_THREADS: u8 = 5;

/// Default number of segments a single file is split into.
pub const DEFAULT_SPLIT: u8 = 1;

/// Origin label used in errors for mappings that did not come from a file.
pub const INPUT_ORIGIN: &str = "<input>";

/// Every key the schema understands. Anything else is ignored.
pub const KNOWN_FIELDS: &[&str] = &[
    "command",
    "logfolder",
    "identifiers",
    "search",
    "threads",
    "split",
    "verify",
    "filefilters",
    "invertfilefiltering",
    "credentials",
    "hashfile",
    "cacherefresh",
    "data_folders",
    "nopaths",
    "output_folder",
    "resume",
];

// ============================================================================
// Field Types
// ============================================================================

/// What the downloader should do with the listed identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Fetch the items.
    #[default]
    Download,
    /// Check previously downloaded items against their remote hashes.
    Verify,
}

/// Concurrency setting in the range `1..=5`.
///
/// Used for both `threads` and `split`. The upper bound keeps load on the
/// archive servers down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Concurrency(u8);

impl Concurrency {
    /// Smallest accepted value.
    pub const MIN: u8 = 1;

    /// Largest accepted value.
    pub const MAX: u8 = 5;

    /// Returns `None` when `value` is outside `1..=5`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Concurrency {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| {
                format!(
                    "expected an integer between {} and {}, got {value}",
                    Self::MIN,
                    Self::MAX
                )
            })
    }
}

impl From<Concurrency> for u8 {
    fn from(value: Concurrency) -> Self {
        value.0
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File name filters, given either as one pattern or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileFilters {
    /// A single pattern.
    One(String),
    /// Several patterns, in order.
    Many(Vec<String>),
}

impl FileFilters {
    /// Returns the patterns in the order they were written.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::One(pattern) => vec![pattern.as_str()],
            Self::Many(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}

/// Username and password for the archive service.
///
/// Written in YAML as a two-element list. The password never appears in
/// `Debug` or serialized output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct Credentials {
    /// Account name or e-mail.
    pub username: String,
    /// Account password.
    pub password: String,
}

const REDACTED: &str = "<redacted>";

impl From<(String, String)> for Credentials {
    fn from((username, password): (String, String)) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.username, REDACTED).serialize(serializer)
    }
}

// ============================================================================
// ConfigArgs
// ============================================================================

/// Validated settings for one downloader run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Mapping")]
pub struct ConfigArgs {
    /// Whether to download or verify
    pub command: Command,

    /// Folder for run logs
    pub logfolder: PathBuf,

    /// Items to process (never empty)
    pub identifiers: Vec<String>,

    /// Archive search query; empty when unused
    pub search: String,

    /// Worker-thread count
    pub threads: Concurrency,

    /// Segments per file
    pub split: Concurrency,

    /// Verify files after download
    pub verify: bool,

    /// File name filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filefilters: Option<FileFilters>,

    /// Treat `filefilters` as an exclusion list
    pub invertfilefiltering: bool,

    /// Archive account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// File holding known hashes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashfile: Option<PathBuf>,

    /// Refresh cached item metadata
    pub cacherefresh: bool,

    /// Folders holding previously downloaded data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_folders: Option<Vec<PathBuf>>,

    /// Flatten remote directory structure
    pub nopaths: bool,

    /// Destination folder
    pub output_folder: PathBuf,

    /// Resume partial downloads
    pub resume: bool,
}

impl ConfigArgs {
    /// Builds a configuration from a raw mapping of field name to value.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] listing every rule or
    /// coercion failure.
    pub fn from_mapping(raw: &Mapping) -> Result<Self, ConfigError> {
        Self::from_mapping_at(raw, INPUT_ORIGIN)
    }

    /// Same as [`ConfigArgs::from_mapping`], labelling errors with `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] on any failure.
    pub fn from_mapping_at(raw: &Mapping, origin: &str) -> Result<Self, ConfigError> {
        let report = Validator::new().validate(raw);
        if report.has_errors() {
            return Err(ConfigError::ValidationError {
                origin: origin.to_string(),
                errors: report.errors,
            });
        }

        Self::coerce(raw).map_err(|errors| ConfigError::ValidationError {
            origin: origin.to_string(),
            errors,
        })
    }

    /// Loads the configuration stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails validation.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let result = ConfigLoader::with_defaults().load(path.as_ref())?;
        Ok(Arc::unwrap_or_clone(result.config))
    }

    /// Loads the configuration stored at [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// See [`ConfigArgs::from_config_file`].
    pub fn from_default_config_file() -> Result<Self, ConfigError> {
        Self::from_config_file(DEFAULT_CONFIG_PATH)
    }

    /// Returns `true` if `field` is a schema field holding a value.
    ///
    /// Unset optional fields and an empty `search` report `false`, as do
    /// names the schema does not know.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        match field {
            "search" => !self.search.is_empty(),
            "filefilters" => self.filefilters.is_some(),
            "credentials" => self.credentials.is_some(),
            "hashfile" => self.hashfile.is_some(),
            "data_folders" => self.data_folders.is_some(),
            other => KNOWN_FIELDS.contains(&other),
        }
    }

    /// Typed construction. Assumes the raw rules already passed.
    pub(crate) fn coerce(raw: &Mapping) -> Result<Self, Vec<ValidationIssue>> {
        let mut fields = FieldReader::new(raw);

        let config = Self {
            command: fields.or_default("command", Command::default()),
            logfolder: fields.text_or_default("logfolder", PathBuf::from(DEFAULT_LOG_FOLDER)),
            identifiers: fields.identifiers(),
            search: fields.text_or_default("search", String::new()),
            threads: fields.concurrency("threads", DEFAULT_THREADS),
            split: fields.concurrency("split", DEFAULT_SPLIT),
            verify: fields.or_default("verify", false),
            filefilters: fields.optional_text("filefilters"),
            invertfilefiltering: fields.or_default("invertfilefiltering", false),
            credentials: fields.optional_text("credentials"),
            hashfile: fields.optional_text("hashfile"),
            cacherefresh: fields.or_default("cacherefresh", false),
            data_folders: fields.optional_text("data_folders"),
            nopaths: fields.or_default("nopaths", false),
            output_folder: fields.text_or_default("output_folder", PathBuf::from(DEFAULT_OUTPUT_FOLDER)),
            resume: fields.or_default("resume", false),
        };

        if fields.issues.is_empty() {
            Ok(config)
        } else {
            Err(fields.issues)
        }
    }
}

impl TryFrom<Mapping> for ConfigArgs {
    type Error = ConfigError;

    fn try_from(raw: Mapping) -> Result<Self, Self::Error> {
        Self::from_mapping(&raw)
    }
}

// ============================================================================
// Field coercion
// ============================================================================

/// Pulls typed values out of the raw mapping, collecting every failure.
struct FieldReader<'a> {
    raw: &'a Mapping,
    issues: Vec<ValidationIssue>,
}

impl<'a> FieldReader<'a> {
    const fn new(raw: &'a Mapping) -> Self {
        Self {
            raw,
            issues: Vec::new(),
        }
    }

    fn decode<T: DeserializeOwned>(&mut self, key: &str, value: &Value) -> Option<T> {
        match serde_yaml::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                self.issues
                    .push(ValidationIssue::error(key, format!("invalid value: {e}")));
                None
            }
        }
    }

    /// Optional text field: absent and `null` both mean unset. Numbers and
    /// booleans keep their written form.
    fn optional_text<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = self.raw;
        match raw.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.decode(key, &textual(value)),
        }
    }

    /// Defaulted field: absent means default, `null` is rejected.
    fn or_default<T: DeserializeOwned>(&mut self, key: &str, default: T) -> T {
        let raw = self.raw;
        match raw.get(key) {
            None => default,
            Some(Value::Null) => {
                self.reject_null(key);
                default
            }
            Some(value) => self.decode(key, value).unwrap_or(default),
        }
    }

    fn text_or_default<T: DeserializeOwned>(&mut self, key: &str, default: T) -> T {
        let raw = self.raw;
        match raw.get(key) {
            None => default,
            Some(Value::Null) => {
                self.reject_null(key);
                default
            }
            Some(value) => self.decode(key, &textual(value)).unwrap_or(default),
        }
    }

    /// `threads` and `split`: whole numbers in `1..=5`, `5.0` included.
    fn concurrency(&mut self, key: &str, default: u8) -> Concurrency {
        let raw = self.raw;
        let value = match raw.get(key) {
            None => return Concurrency(default),
            Some(Value::Null) => {
                self.reject_null(key);
                return Concurrency(default);
            }
            Some(value) => value,
        };

        let parsed = whole_number(value)
            .ok_or_else(|| format!("expected an integer, got {}", value_kind(value)))
            .and_then(Concurrency::try_from);
        match parsed {
            Ok(concurrency) => concurrency,
            Err(message) => {
                self.issues
                    .push(ValidationIssue::error(key, format!("invalid value: {message}")));
                Concurrency(default)
            }
        }
    }

    fn reject_null(&mut self, key: &str) {
        self.issues
            .push(ValidationIssue::error(key, "must not be null"));
    }

    /// Identifiers are strings, but unquoted numeric item names are common,
    /// so scalar items are accepted in their textual form.
    fn identifiers(&mut self) -> Vec<String> {
        let raw = self.raw;
        let Some(Value::Sequence(items)) = raw.get("identifiers") else {
            let kind = raw.get("identifiers").map_or("nothing", value_kind);
            self.issues.push(ValidationIssue::error(
                "identifiers",
                format!("expected a list of identifiers, got {kind}"),
            ));
            return Vec::new();
        };

        let mut identifiers = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match textual(item) {
                Value::String(s) => identifiers.push(s),
                other => self.issues.push(ValidationIssue::error(
                    format!("identifiers[{index}]"),
                    format!("expected a string, got {}", value_kind(&other)),
                )),
            }
        }
        identifiers
    }
}

/// Rewrites numeric and boolean scalars, including list items, as strings.
fn textual(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Sequence(items) => Value::Sequence(items.iter().map(textual).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
