//! Shared integration-test harness for running the `ia-downloader` binary
//! against YAML fixtures.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Helpers for invoking the compiled binary.
pub struct DownloaderProcess;

impl DownloaderProcess {
    /// Runs the binary with `args` and waits for it to exit.
    ///
    /// Log level is pinned so assertions on stderr do not depend on the
    /// caller's environment.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ia-downloader"))
            .args(args)
            .env("IA_DOWNLOADER_LOG_LEVEL", "warn")
            .env_remove("IA_DOWNLOADER_CONFIG")
            .env("NO_COLOR", "1")
            .output()
            .expect("failed to run ia-downloader")
    }

    /// Absolute path of a file in `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Like [`DownloaderProcess::fixture_path`], as a `String` argument.
    pub fn fixture_arg(name: &str) -> String {
        Self::fixture_path(name)
            .to_str()
            .expect("non-UTF-8 fixture path")
            .to_string()
    }
}
