//! Configuration command handlers
//!
//! `validate` and `show` load configuration files exactly as a download run
//! would, without contacting the archive.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::{OutputFormat, ShowArgs, ShowFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions, resolve_config_path};
use crate::error::{ConfigError, DownloaderError};

/// Validate configuration files.
///
/// With no files given, validates `config/config.yaml`.
///
/// # Errors
///
/// Returns the first load or validation failure, after every file has been
/// reported.
pub fn validate(args: &ValidateArgs, quiet: bool) -> Result<(), DownloaderError> {
    let files = if args.files.is_empty() {
        vec![resolve_config_path(None)]
    } else {
        args.files.clone()
    };

    let loader = loader(args.strict);

    match args.format {
        OutputFormat::Human => {
            let mut first_error = None;

            for path in &files {
                match load_logged(&loader, path) {
                    Ok(result) if !quiet => println!(
                        "{}: valid ({} identifiers, {} warnings)",
                        path.display(),
                        result.config.identifiers.len(),
                        result.warnings.len()
                    ),
                    Ok(_) => {}
                    Err(err) => {
                        if !quiet {
                            println!("{}: invalid ({})", path.display(), error_count(&err));
                        }
                        first_error.get_or_insert(err);
                    }
                }
            }

            first_error.map_or(Ok(()), |err| Err(err.into()))
        }
        OutputFormat::Json => {
            let mut reports = Vec::with_capacity(files.len());
            let mut first_error = None;

            for path in &files {
                match load_logged(&loader, path) {
                    Ok(result) => reports.push(FileReport::valid(path, &result.warnings)),
                    Err(err) => {
                        reports.push(FileReport::invalid(path, &err));
                        first_error.get_or_insert(err);
                    }
                }
            }

            let report = ValidationReport::new(reports);
            println!("{}", serde_json::to_string_pretty(&report)?);

            first_error.map_or(Ok(()), |err| Err(err.into()))
        }
    }
}

/// Print the resolved configuration.
///
/// # Errors
///
/// Returns an error if loading fails or the configuration cannot be
/// serialized.
pub fn show(args: &ShowArgs) -> Result<(), DownloaderError> {
    let path = resolve_config_path(args.config.as_deref());
    let result = load_logged(&loader(args.strict), &path)?;

    let rendered = match args.format {
        ShowFormat::Yaml => serde_yaml::to_string(&*result.config)?,
        ShowFormat::Json => serde_json::to_string_pretty(&*result.config)?,
    };
    println!("{}", rendered.trim_end());

    Ok(())
}

fn error_count(err: &ConfigError) -> String {
    match err.issues().len() {
        0 | 1 => "1 error".to_string(),
        n => format!("{n} errors"),
    }
}

fn loader(strict: bool) -> ConfigLoader {
    ConfigLoader::new(LoaderOptions {
        strict,
        ..LoaderOptions::default()
    })
}

/// Loads one file, logging progress and any warnings.
fn load_logged(loader: &ConfigLoader, path: &Path) -> Result<LoadResult, ConfigError> {
    tracing::info!(file = %path.display(), "validating configuration");

    let result = loader.load(path)?;
    for warning in &result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    tracing::info!(file = %path.display(), "configuration valid");
    Ok(result)
}

// ============================================================================
// JSON report
// ============================================================================

#[derive(Debug, Serialize)]
struct ValidationReport {
    files: Vec<FileReport>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    valid: usize,
    invalid: usize,
}

impl ValidationReport {
    fn new(files: Vec<FileReport>) -> Self {
        let valid = files.iter().filter(|f| f.valid).count();
        let summary = Summary {
            total: files.len(),
            valid,
            invalid: files.len() - valid,
        };
        Self { files, summary }
    }
}

impl FileReport {
    fn valid(path: &Path, warnings: &[LoadWarning]) -> Self {
        Self {
            path: path.to_path_buf(),
            valid: true,
            errors: Vec::new(),
            warnings: warnings
                .iter()
                .map(|w| match &w.location {
                    Some(location) => format!("{} at {location}", w.message),
                    None => w.message.clone(),
                })
                .collect(),
        }
    }

    fn invalid(path: &Path, err: &ConfigError) -> Self {
        let errors = if err.issues().is_empty() {
            vec![err.to_string()]
        } else {
            err.issues().iter().map(ToString::to_string).collect()
        };

        Self {
            path: path.to_path_buf(),
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}
