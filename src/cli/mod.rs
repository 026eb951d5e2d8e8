//! Command-line interface
//!
//! Argument definitions and command handlers for the `ia-downloader` binary.

pub mod args;
pub mod commands;
