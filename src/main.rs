//! `ia-downloader` - Internet Archive downloader

use clap::Parser;

use ia_downloader::cli::args::Cli;
use ia_downloader::cli::commands;
use ia_downloader::error::ExitCode;
use ia_downloader::observability::{LogSettings, init_logging};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::USAGE_ERROR
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if !cli.quiet {
        init_logging(LogSettings::from_cli(&cli));
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
