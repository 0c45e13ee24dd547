//! Subcommand implementations

use crate::commands::{ConfigArgs, GenerateArgs, GenerateKind};
use crate::error::{CliError, CliResult};
use crate::output::Output;
use serde_json::Value;
use storecheck::datagen::{DataGenerator, RecordKind};
use storecheck::SuiteConfig;
use tracing::debug;

/// Records for `generate`, as a JSON array
pub fn generate_records(args: &GenerateArgs) -> CliResult<Value> {
    if args.count == 0 {
        return Err(CliError::invalid_argument("--count must be at least 1"));
    }
    let mut gen = DataGenerator::from_seed(args.seed);
    let kind = match args.kind {
        GenerateKind::User => RecordKind::User,
        GenerateKind::Email => RecordKind::Email,
        GenerateKind::Address => RecordKind::Address,
        GenerateKind::CreditCard => RecordKind::CreditCard,
        GenerateKind::Signup => {
            let records: Vec<_> = (0..args.count).map(|_| DataGenerator::signup_record()).collect();
            return Ok(serde_json::to_value(records)?);
        }
    };
    debug!(?kind, count = args.count, seed = ?args.seed, "generate");
    Ok(serde_json::to_value(gen.bulk(args.count, kind))?)
}

/// Print generated records
pub fn run_generate(args: &GenerateArgs, out: &Output) -> CliResult<()> {
    let records = generate_records(args)?;
    out.data(&serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Bundle, file and `STORECHECK_*` overrides, in that order
pub fn resolve_config(args: &ConfigArgs) -> CliResult<SuiteConfig> {
    let lookup = |key: &str| std::env::var(key).ok();
    let config = match (&args.file, &args.env) {
        (Some(file), _) => SuiteConfig::from_yaml_file(file)?.with_overrides(lookup)?,
        (None, Some(env)) => SuiteConfig::for_environment(env.parse()?).with_overrides(lookup)?,
        (None, None) => SuiteConfig::from_env()?,
    };
    Ok(config)
}

/// Print the resolved configuration as YAML
pub fn run_config(args: &ConfigArgs, out: &Output) -> CliResult<()> {
    let config = resolve_config(args)?;
    out.header(&format!("environment: {}", config.environment));
    let yaml = serde_yaml_ng::to_string(&config).map_err(|e| CliError::config(e.to_string()))?;
    out.data(yaml.trim_end());
    Ok(())
}

#[cfg(feature = "api")]
mod api {
    use super::*;
    use crate::commands::{ApiArgs, ApiEndpoint};
    use std::time::Instant;
    use storecheck::api::ApiClient;

    /// Call one endpoint and check its contract
    pub fn run_api(args: &ApiArgs, out: &Output) -> CliResult<()> {
        let mut config = SuiteConfig::from_env()?;
        if let Some(url) = &args.api_url {
            config = config.with_api_url(url.clone());
        }
        let client = ApiClient::new(&config)?;
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(call(&client, args, out))
    }

    async fn call(client: &ApiClient, args: &ApiArgs, out: &Output) -> CliResult<()> {
        out.header(&format!("{} ({})", describe(&args.endpoint), client.api_url()));
        let started = Instant::now();
        let body = match &args.endpoint {
            ApiEndpoint::Products => {
                let body = client.get_products().await?;
                body.verify_well_formed()?;
                out.pass(&format!("{} products, responseCode {}", body.products.len(), body.response_code));
                serde_json::to_value(body)?
            }
            ApiEndpoint::Brands => {
                let body = client.get_brands().await?;
                let dupes = body.duplicate_ids();
                if !dupes.is_empty() {
                    return Err(CliError::check_failed(format!("duplicate brand ids: {dupes:?}")));
                }
                out.pass(&format!("{} brands, responseCode {}", body.brands.len(), body.response_code));
                serde_json::to_value(body)?
            }
            ApiEndpoint::Search { term } => {
                let body = client.search_products(term).await?;
                out.pass(&format!("{} matches for {term:?}, responseCode {}", body.products.len(), body.response_code));
                serde_json::to_value(body)?
            }
        };
        out.pass(&format!("answered in {} ms", started.elapsed().as_millis()));
        if args.json {
            out.data(&serde_json::to_string_pretty(&body)?);
        }
        Ok(())
    }

    fn describe(endpoint: &ApiEndpoint) -> &'static str {
        match endpoint {
            ApiEndpoint::Products => "GET productsList",
            ApiEndpoint::Brands => "GET brandsList",
            ApiEndpoint::Search { .. } => "POST searchProduct",
        }
    }
}

#[cfg(feature = "api")]
pub use api::run_api;
