//! CLI module
//!
//! Command-line interface for producing drops.
//!
//! # Commands
//!
//! - `run` - Download, transform and publish a drop
//! - `check` - Validate the configuration and list reachable reports
//! - `serve` - Start HTTP server mode for event-triggered runs

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
