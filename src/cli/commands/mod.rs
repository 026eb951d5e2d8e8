//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod config;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::DownloaderError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), DownloaderError> {
    match cli.command {
        Commands::Validate(args) => config::validate(&args, cli.quiet),
        Commands::Show(args) => config::show(&args),
        Commands::Version(args) => version::run(&args),
    }
}
