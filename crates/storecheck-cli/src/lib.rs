//! Storecheck CLI library
//!
//! Argument definitions and subcommand handlers behind the `storecheck`
//! binary.

#![warn(missing_docs)]

mod commands;
mod error;
mod handlers;
mod output;

pub use commands::{ApiArgs, ApiEndpoint, Cli, ColorArg, Commands, ConfigArgs, GenerateArgs, GenerateKind};
pub use error::{CliError, CliResult};
#[cfg(feature = "api")]
pub use handlers::run_api;
pub use handlers::{generate_records, resolve_config, run_config, run_generate};
pub use output::Output;
