//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Storecheck: test data, configuration and API smoke checks for
/// storefront e2e suites
#[derive(Parser, Debug)]
#[command(name = "storecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate random test records as JSON
    Generate(GenerateArgs),

    /// Call the storefront API and check the response contract
    Api(ApiArgs),

    /// Show the resolved suite configuration
    Config(ConfigArgs),
}

/// Record kinds for `generate`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateKind {
    /// Full user profile
    User,
    /// Unique email address
    Email,
    /// Postal address
    Address,
    /// Test-only card number
    CreditCard,
    /// Signup form record with a unique email
    Signup,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// What to generate
    #[arg(value_enum)]
    pub kind: GenerateKind,

    /// Number of records
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Seed for repeatable output (unique stamps still vary)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the api command
#[derive(Parser, Debug)]
pub struct ApiArgs {
    /// Endpoint to call
    #[command(subcommand)]
    pub endpoint: ApiEndpoint,

    /// API root, overriding the configured one
    #[arg(long, env = "STORECHECK_API_URL")]
    pub api_url: Option<String>,

    /// Print the decoded body as JSON
    #[arg(long)]
    pub json: bool,
}

/// API endpoints
#[derive(Subcommand, Debug, Clone)]
pub enum ApiEndpoint {
    /// GET the product list
    Products,
    /// GET the brand list
    Brands,
    /// POST a product search
    Search {
        /// Search term
        term: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Environment bundle (staging, production, local); defaults to
    /// `STORECHECK_ENV`
    #[arg(short, long)]
    pub env: Option<String>,

    /// YAML config file; its `environment` key picks the bundle
    #[arg(short, long, conflicts_with = "env")]
    pub file: Option<PathBuf>,
}

/// Color argument for CLI
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}
