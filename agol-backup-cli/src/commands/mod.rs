//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, path, show)
//! - [`resolve`] - Check catalog entries against live services
//! - [`run`] - Main command (back up every catalog entry)

pub mod common;
pub mod config;
pub mod resolve;
pub mod run;
