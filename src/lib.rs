#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_excessive_bools)]

use anyhow::Result;
use std::process::ExitCode;

mod app;
mod cli;
pub mod client;
pub mod display;
pub mod error;
pub mod json;
pub mod providers;
mod results;
pub mod server;
mod user_config;
pub mod validate;

/// Runs the main application logic.
///
/// This function parses command-line arguments, loads the user configuration
/// and dispatches to the requested subcommand: serving the lookup endpoint,
/// looking up one address through it, or printing the configuration.
///
/// # Errors
///
/// Returns an error if setup fails (e.g., an invalid URL or bind address, or
/// a client that cannot be built) or if the server stops unexpectedly.
pub async fn run() -> Result<ExitCode> {
  app::App::new().run().await
}
