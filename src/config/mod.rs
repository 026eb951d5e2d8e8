//! Configuration module
//!
//! Loads and validates the downloader's run configuration from YAML.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions, resolve_config_path};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
