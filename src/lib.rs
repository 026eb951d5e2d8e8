//! `ia-downloader` - Internet Archive downloader configuration
//!
//! Loads a run configuration from YAML, validates it, and hands the
//! download and verification engines an immutable, typed settings object.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
