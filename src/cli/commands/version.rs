//! `version` command

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::error::DownloaderError;

/// Print the package name and version.
///
/// # Errors
///
/// Returns an error only if JSON encoding fails.
pub fn run(args: &VersionArgs) -> Result<(), DownloaderError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match args.format {
        OutputFormat::Human => println!("{name} {version}"),
        OutputFormat::Json => {
            let info = serde_json::json!({ "name": name, "version": version });
            println!("{}", serde_json::to_string(&info)?);
        }
    }
    Ok(())
}
