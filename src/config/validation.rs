//! Raw-input validation
//!
//! Runs on the untyped YAML mapping before any field is coerced. Checks the
//! legality rules that span fields (identifier presence, concurrency caps,
//! the split/threads interaction) and records warnings for input that is
//! accepted but probably not what the user meant.
//!
//! Validation collects ALL issues rather than stopping at the first one.

use serde_yaml::{Mapping, Value};

use crate::config::schema::{Concurrency, DEFAULT_SPLIT, DEFAULT_THREADS, KNOWN_FIELDS};
use crate::error::{Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of raw-input validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Raw-input validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a raw configuration mapping and returns the result.
    pub fn validate(&mut self, raw: &Mapping) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_identifiers(raw);

        let threads = self.validate_cap(raw, "threads", DEFAULT_THREADS);
        let split = self.validate_cap(raw, "split", DEFAULT_SPLIT);
        if let (Some(threads), Some(split)) = (threads, split) {
            self.validate_split_threads(threads, split);
        }

        self.validate_credentials_context(raw);
        self.validate_unknown_keys(raw);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Rules
    // ========================================================================

    /// `identifiers` must be present and non-empty.
    ///
    /// Only emptiness is judged here; a value of the wrong shape is left to
    /// typed coercion so it is reported once.
    fn validate_identifiers(&mut self, raw: &Mapping) {
        let empty = match raw.get("identifiers") {
            None | Some(Value::Null) => true,
            Some(Value::Sequence(items)) => items.is_empty(),
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };

        if empty {
            self.add_error("identifiers", "at least one identifier is required");
        }
    }

    /// `threads` and `split` may not exceed five.
    ///
    /// Returns the value rule evaluation should use: the raw integer, the
    /// default when the key is absent, or `None` when the value is not a
    /// whole number (coercion reports that).
    fn validate_cap(&mut self, raw: &Mapping, key: &str, default: u8) -> Option<i64> {
        let value = match raw.get(key) {
            None => i64::from(default),
            Some(value) => whole_number(value)?,
        };

        if value > i64::from(Concurrency::MAX) {
            self.add_error(
                key,
                &format!(
                    "must be at most {} to limit load on the archive servers, got {value}",
                    Concurrency::MAX
                ),
            );
        }

        Some(value)
    }

    /// Splitting files across segments is only allowed with a single thread.
    fn validate_split_threads(&mut self, threads: i64, split: i64) {
        if split > 1 && threads != 1 {
            self.add_error(
                "split",
                &format!("split > 1 requires threads to be 1, got threads {threads} and split {split}"),
            );
        }
    }

    /// Credentials mixed with settings other than `identifiers`.
    ///
    /// Accepted, but flagged so strict mode can reject it.
    fn validate_credentials_context(&mut self, raw: &Mapping) {
        if matches!(raw.get("credentials"), None | Some(Value::Null)) {
            return;
        }

        let others: Vec<String> = raw
            .keys()
            .map(key_name)
            .filter(|k| k != "credentials" && k != "identifiers")
            .collect();

        if !others.is_empty() {
            self.add_warning(
                "credentials",
                &format!(
                    "credentials combined with other settings ({}); strict mode only accepts them alongside 'identifiers'",
                    others.join(", ")
                ),
            );
        }
    }

    fn validate_unknown_keys(&mut self, raw: &Mapping) {
        for key in raw.keys().map(key_name) {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                self.add_warning(&key, &format!("unknown key '{key}' ignored"));
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Renders a mapping key for messages. Non-string keys use their YAML form.
fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| value_kind(other).to_string()),
    }
}

/// Short human name for the kind of a YAML value.
#[must_use]
pub const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Integer value of a YAML number, accepting floats with no fractional part.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
pub(crate) fn whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    let n = f as i64;
    (n as f64 == f).then_some(n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let raw: Mapping = serde_yaml::from_str(yaml).unwrap();
        Validator::new().validate(&raw)
    }

    fn error_paths(result: &ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_validate_minimal_config() {
        let result = validate("identifiers: [item1]");
        assert!(!result.has_errors());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_missing_identifiers() {
        let result = validate("threads: 2");
        assert_eq!(error_paths(&result), vec!["identifiers"]);
    }

    #[test]
    fn test_validate_empty_identifiers() {
        let result = validate("identifiers: []");
        assert_eq!(error_paths(&result), vec!["identifiers"]);
    }

    #[test]
    fn test_validate_null_identifiers() {
        let result = validate("identifiers: ~");
        assert_eq!(error_paths(&result), vec!["identifiers"]);
    }

    #[test]
    fn test_validate_threads_above_cap() {
        let result = validate("identifiers: [a]\nthreads: 6");
        assert_eq!(error_paths(&result), vec!["threads"]);
        assert!(result.errors[0].message.contains("at most 5"));
    }

    #[test]
    fn test_validate_split_above_cap() {
        let result = validate("identifiers: [a]\nthreads: 1\nsplit: 9");
        assert_eq!(error_paths(&result), vec!["split"]);
    }

    #[test]
    fn test_validate_split_with_default_threads() {
        // threads defaults to 5, so any split > 1 needs threads spelled out
        let result = validate("identifiers: [item1]\nsplit: 2");
        assert_eq!(error_paths(&result), vec!["split"]);
    }

    #[test]
    fn test_validate_split_with_many_threads() {
        let result = validate("identifiers: [item1]\nthreads: 5\nsplit: 2");
        assert_eq!(error_paths(&result), vec!["split"]);
        assert!(result.errors[0].message.contains("threads to be 1"));
    }

    #[test]
    fn test_validate_split_with_single_thread() {
        let result = validate("identifiers: [item1]\nthreads: 1\nsplit: 5");
        assert!(!result.has_errors());
    }

    #[test]
    fn test_validate_threads_with_single_split() {
        let result = validate("identifiers: [item1]\nthreads: 4\nsplit: 1");
        assert!(!result.has_errors());
    }

    #[test]
    fn test_validate_non_integer_threads_left_to_coercion() {
        let result = validate("identifiers: [a]\nthreads: many\nsplit: 3");
        assert!(!result.has_errors());
    }

    #[test]
    fn test_validate_whole_float_counts_as_integer() {
        let result = validate("identifiers: [a]\nthreads: 5.0\nsplit: 2.0");
        assert_eq!(error_paths(&result), vec!["split"]);

        let result = validate("identifiers: [a]\nthreads: 6.0");
        assert_eq!(error_paths(&result), vec!["threads"]);
    }

    #[test]
    fn test_whole_number() {
        let number = |yaml: &str| whole_number(&serde_yaml::from_str::<Value>(yaml).unwrap());
        assert_eq!(number("3"), Some(3));
        assert_eq!(number("3.0"), Some(3));
        assert_eq!(number("-2"), Some(-2));
        assert_eq!(number("2.5"), None);
        assert_eq!(number(".nan"), None);
        assert_eq!(number(".inf"), None);
        assert_eq!(number("three"), None);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let result = validate("identifiers: []\nthreads: 8\nsplit: 7");
        assert_eq!(error_paths(&result), vec!["identifiers", "threads", "split", "split"]);
    }

    #[test]
    fn test_validate_unknown_key_warning() {
        let result = validate("identifiers: [item1]\nfoo: bar");
        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "foo");
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_validate_non_string_key_warning() {
        let result = validate("identifiers: [item1]\n42: bar");
        assert!(!result.has_errors());
        assert_eq!(result.warnings[0].path, "42");
    }

    #[test]
    fn test_validate_credentials_with_identifiers_only() {
        let result = validate("identifiers: [a]\ncredentials: [user, pass]");
        assert!(!result.has_errors());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_credentials_with_other_settings_warns() {
        let result = validate("identifiers: [a]\ncredentials: [user, pass]\nthreads: 2");
        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "credentials");
        assert!(result.warnings[0].message.contains("threads"));
    }

    #[test]
    fn test_validate_null_credentials_ignored() {
        let result = validate("identifiers: [a]\ncredentials: ~\nthreads: 2");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validator_reusable() {
        let mut validator = Validator::new();
        let bad: Mapping = serde_yaml::from_str("identifiers: []").unwrap();
        let good: Mapping = serde_yaml::from_str("identifiers: [a]").unwrap();
        assert!(validator.validate(&bad).has_errors());
        assert!(!validator.validate(&good).has_errors());
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&Value::Null), "null");
        assert_eq!(value_kind(&Value::Bool(true)), "a boolean");
        assert_eq!(value_kind(&Value::String(String::new())), "a string");
        assert_eq!(value_kind(&Value::Sequence(Vec::new())), "a list");
    }
}
