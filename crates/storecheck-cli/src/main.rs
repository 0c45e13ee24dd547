//! Storecheck CLI
//!
//! ## Usage
//!
//! ```bash
//! storecheck generate user -n 5 --seed 42   # Random users as JSON
//! storecheck api products                   # Product list contract check
//! storecheck api search "top"               # Search contract check
//! storecheck config --env production        # Resolved configuration
//! ```

use clap::Parser;
use std::process::ExitCode;
use storecheck::logging::{init_tracing, LogFormat};
use storecheck_cli::{run_config, run_generate, Cli, CliResult, Commands, Output};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(if cli.quiet { 0 } else { cli.verbose }, format);
    let out = Output::new(cli.color, cli.quiet);

    match cli.command {
        Commands::Generate(args) => run_generate(&args, &out),
        Commands::Config(args) => run_config(&args, &out),
        #[cfg(feature = "api")]
        Commands::Api(args) => storecheck_cli::run_api(&args, &out),
        #[cfg(not(feature = "api"))]
        Commands::Api(_) => Err(storecheck_cli::CliError::config(
            "API checks not enabled. Rebuild with --features api",
        )),
    }
}
