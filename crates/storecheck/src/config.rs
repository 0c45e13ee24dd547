//! Suite configuration: environment bundles, YAML files and env overrides.
//!
//! Precedence, lowest first: the bundle for the selected [`Environment`],
//! a YAML file, then `STORECHECK_*` process variables.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default origin of the storefront under test
pub const DEFAULT_BASE_URL: &str = "https://automationexercise.com";

/// Default element wait budget
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Named configuration bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Shared staging origin
    #[default]
    Staging,
    /// Production origin, longer budgets
    Production,
    /// Locally served copy of the storefront
    Local,
}

impl Environment {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Local => "local",
        }
    }

    /// Parse a name, falling back to staging for anything unrecognized
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for Environment {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            "local" => Ok(Self::Local),
            other => Err(CheckError::Config {
                message: format!("unknown environment '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser viewport in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewport {
    /// Desktop layout
    pub const DESKTOP: Self = Self {
        width: 1280,
        height: 720,
    };

    /// Phone-sized layout
    pub const MOBILE: Self = Self {
        width: 375,
        height: 667,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Paths of the JSON API relative to `api_url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Product listing
    pub products: String,
    /// Brand listing
    pub brands: String,
    /// Product search (form POST)
    pub search_product: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            products: "/productsList".to_string(),
            brands: "/brandsList".to_string(),
            search_product: "/searchProduct".to_string(),
        }
    }
}

/// Everything a session, the API client and the suite runner need to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Selected bundle
    pub environment: Environment,
    /// Origin for page visits
    pub base_url: String,
    /// Prefix for API endpoints
    pub api_url: String,
    /// Element wait budget
    pub timeout_ms: u64,
    /// Retries granted to flaky operations
    pub retries: u32,
    /// Viewport applied at scenario start
    pub viewport: Viewport,
    /// Budget for sending a request
    pub request_timeout_ms: u64,
    /// Budget for receiving a response
    pub response_timeout_ms: u64,
    /// Budget for a page navigation
    pub page_load_timeout_ms: u64,
    /// API endpoint paths
    pub endpoints: Endpoints,
    /// Where screenshots land
    pub screenshots_dir: PathBuf,
    /// Where JSON fixtures live
    pub fixtures_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Staging)
    }
}

impl SuiteConfig {
    /// Create the staging configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle for an environment
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let (base_url, timeout_ms, retries) = match environment {
            Environment::Staging => (DEFAULT_BASE_URL, DEFAULT_COMMAND_TIMEOUT_MS, 2),
            Environment::Production => (DEFAULT_BASE_URL, 15_000, 3),
            Environment::Local => ("http://localhost:3000", 5_000, 1),
        };
        Self {
            environment,
            base_url: base_url.to_string(),
            api_url: format!("{base_url}/api"),
            timeout_ms,
            retries,
            viewport: Viewport::DESKTOP,
            request_timeout_ms: 10_000,
            response_timeout_ms: 30_000,
            page_load_timeout_ms: 30_000,
            endpoints: Endpoints::default(),
            screenshots_dir: PathBuf::from("target/storecheck/screenshots"),
            fixtures_dir: PathBuf::from("fixtures"),
        }
    }

    /// Set the base URL; the API URL follows unless set afterwards
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        let url = url.trim_end_matches('/').to_string();
        self.api_url = format!("{url}/api");
        self.base_url = url;
        self
    }

    /// Set the API URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the element wait budget
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the viewport
    #[must_use]
    pub const fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the screenshots directory
    #[must_use]
    pub fn with_screenshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshots_dir = dir.into();
        self
    }

    /// Set the fixtures directory
    #[must_use]
    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = dir.into();
        self
    }

    /// Join a path onto the base URL; absolute URLs pass through
    #[must_use]
    pub fn page_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Join an endpoint path onto the API URL
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        join_url(&self.api_url, endpoint)
    }

    /// Parse a YAML document layered over the bundle it names
    pub fn from_yaml_str(yaml: &str) -> CheckResult<Self> {
        let overlay: ConfigOverlay = serde_yaml_ng::from_str(yaml).map_err(|e| CheckError::Config {
            message: format!("invalid config YAML: {e}"),
        })?;
        let mut config = Self::for_environment(overlay.environment.unwrap_or_default());
        overlay.apply(&mut config);
        Ok(config)
    }

    /// Load a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> CheckResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| CheckError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Build from the process environment
    pub fn from_env() -> CheckResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup, starting from the bundle
    /// named by `STORECHECK_ENV` (staging when unset or unrecognized)
    pub fn from_lookup<F>(lookup: F) -> CheckResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("STORECHECK_ENV")
            .map(|name| Environment::parse_or_default(&name))
            .unwrap_or_default();
        Self::for_environment(environment).with_overrides(lookup)
    }

    /// Apply `STORECHECK_*` overrides on top of this config
    pub fn with_overrides<F>(mut self, lookup: F) -> CheckResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STORECHECK_BASE_URL") {
            self = self.with_base_url(url);
        }
        if let Some(url) = lookup("STORECHECK_API_URL") {
            self = self.with_api_url(url);
        }
        if let Some(raw) = lookup("STORECHECK_TIMEOUT_MS") {
            self.timeout_ms = parse_number("STORECHECK_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("STORECHECK_RETRIES") {
            self.retries = parse_number("STORECHECK_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("STORECHECK_MOBILE") {
            if matches!(raw.trim(), "1" | "true" | "yes") {
                self.viewport = Viewport::MOBILE;
            }
        }
        Ok(self)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> CheckResult<T> {
    raw.trim().parse().map_err(|_| CheckError::Config {
        message: format!("{key} must be a non-negative integer, got '{raw}'"),
    })
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Partial config as written in a YAML file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigOverlay {
    environment: Option<Environment>,
    base_url: Option<String>,
    api_url: Option<String>,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    viewport: Option<Viewport>,
    request_timeout_ms: Option<u64>,
    response_timeout_ms: Option<u64>,
    page_load_timeout_ms: Option<u64>,
    endpoints: Option<Endpoints>,
    screenshots_dir: Option<PathBuf>,
    fixtures_dir: Option<PathBuf>,
}

impl ConfigOverlay {
    fn apply(self, config: &mut SuiteConfig) {
        if let Some(url) = self.base_url {
            *config = std::mem::take(config).with_base_url(url);
        }
        if let Some(url) = self.api_url {
            *config = std::mem::take(config).with_api_url(url);
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
        if let Some(v) = self.retries {
            config.retries = v;
        }
        if let Some(v) = self.viewport {
            config.viewport = v;
        }
        if let Some(v) = self.request_timeout_ms {
            config.request_timeout_ms = v;
        }
        if let Some(v) = self.response_timeout_ms {
            config.response_timeout_ms = v;
        }
        if let Some(v) = self.page_load_timeout_ms {
            config.page_load_timeout_ms = v;
        }
        if let Some(v) = self.endpoints {
            config.endpoints = v;
        }
        if let Some(v) = self.screenshots_dir {
            config.screenshots_dir = v;
        }
        if let Some(v) = self.fixtures_dir {
            config.fixtures_dir = v;
        }
    }
}

/// Kind of canned account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// Administrator
    Admin,
    /// Ordinary shopper
    #[default]
    Regular,
}

/// Canned login for a pre-provisioned account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
    /// Display name
    pub name: String,
}

impl Credentials {
    /// Canned account for an environment; local falls back to staging
    #[must_use]
    pub fn for_user(kind: UserKind, environment: Environment) -> Self {
        let (email, password, name) = match (environment, kind) {
            (Environment::Production, UserKind::Admin) => {
                ("admin.prod@example.com", "AdminProd123!", "Admin User")
            }
            (Environment::Production, UserKind::Regular) => {
                ("testuser.prod@example.com", "TestProd123!", "Test User")
            }
            (Environment::Staging, UserKind::Admin) => {
                ("admin.staging@example.com", "AdminStaging123!", "Admin User")
            }
            _ => ("testuser.staging@example.com", "TestStaging123!", "Test User"),
        };
        Self {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }
}
