//! Network interception: aliased routes over the page's request log.
//!
//! A route is registered under an alias; waiting on the alias consumes the
//! next matching request the page issued, so two waits on the same alias
//! need two matching requests.

use crate::result::{CheckError, CheckResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// Matches every method (routes only)
    Any,
}

impl HttpMethod {
    /// Uppercase wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Any => "*",
        }
    }

    /// Whether a route method accepts a request method
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        *self == Self::Any || *other == Self::Any || self == other
    }
}

impl FromStr for HttpMethod {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "*" | "ANY" => Ok(Self::Any),
            other => Err(CheckError::Config {
                message: format!("unknown HTTP method '{other}'"),
            }),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL matcher for routes
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Whole URL equals
    Exact(String),
    /// URL starts with
    Prefix(String),
    /// URL contains
    Contains(String),
    /// `*` spans one path segment, `**` spans any number
    Glob(String),
    /// Regular expression
    Regex(Regex),
    /// Every URL
    Any,
}

impl UrlPattern {
    /// Glob when the text has `*`, substring otherwise
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" || pattern == "**" {
            Self::Any
        } else if pattern.contains('*') {
            Self::Glob(pattern.to_string())
        } else {
            Self::Contains(pattern.to_string())
        }
    }

    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> CheckResult<Self> {
        Regex::new(pattern).map(Self::Regex).map_err(|e| CheckError::Config {
            message: format!("invalid URL regex '{pattern}': {e}"),
        })
    }

    /// Whether a URL matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(s) => url == s,
            Self::Prefix(s) => url.starts_with(s.as_str()),
            Self::Contains(s) => url.contains(s.as_str()),
            Self::Glob(g) => glob_to_regex(g).is_some_and(|re| re.is_match(url)),
            Self::Regex(re) => re.is_match(url),
            Self::Any => true,
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) | Self::Prefix(s) | Self::Contains(s) | Self::Glob(s) => f.write_str(s),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Any => f.write_str("*"),
        }
    }
}

fn glob_to_regex(glob: &str) -> Option<Regex> {
    let mut out = String::from("^");
    let mut rest = glob;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            out.push_str("[^/]*");
            rest = tail;
        } else {
            let end = rest.find('*').unwrap_or(rest.len());
            out.push_str(&regex::escape(&rest[..end]));
            rest = &rest[end..];
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}

/// A request the page issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// Response status, once known
    pub status: Option<u16>,
    /// Request body as text
    pub body: Option<String>,
}

impl CapturedRequest {
    /// Create a captured request
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            status: None,
            body: None,
        }
    }

    /// Set response status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Aliased route
#[derive(Debug, Clone)]
pub struct Route {
    /// Method filter
    pub method: HttpMethod,
    /// URL filter
    pub pattern: UrlPattern,
    /// Name used to wait on it
    pub alias: String,
}

impl Route {
    /// Create a route
    #[must_use]
    pub fn new(method: HttpMethod, pattern: UrlPattern, alias: impl Into<String>) -> Self {
        Self {
            method,
            pattern,
            alias: alias.into(),
        }
    }

    /// Whether a captured request belongs to this route
    #[must_use]
    pub fn matches(&self, request: &CapturedRequest) -> bool {
        self.method.matches(&request.method) && self.pattern.matches(&request.url)
    }
}

#[derive(Debug, Default)]
struct InterceptState {
    routes: HashMap<String, Route>,
    consumed: HashMap<String, usize>,
}

/// Shared table of aliased routes
#[derive(Debug, Clone, Default)]
pub struct NetworkInterception {
    state: Arc<Mutex<InterceptState>>,
}

impl NetworkInterception {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a route; its consumption count restarts
    pub fn intercept(&self, route: Route) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.consumed.insert(route.alias.clone(), 0);
        state.routes.insert(route.alias.clone(), route);
    }

    /// Whether an alias is registered
    #[must_use]
    pub fn has_alias(&self, alias: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .routes
            .contains_key(alias)
    }

    /// Route registered under an alias
    pub fn route(&self, alias: &str) -> CheckResult<Route> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .routes
            .get(alias)
            .cloned()
            .ok_or_else(|| CheckError::Config {
                message: format!("no route aliased '@{alias}'"),
            })
    }

    /// Take the next unconsumed request for `alias` from `log`
    pub fn take_next(&self, alias: &str, log: &[CapturedRequest]) -> CheckResult<Option<CapturedRequest>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let route = state.routes.get(alias).cloned().ok_or_else(|| CheckError::Config {
            message: format!("no route aliased '@{alias}'"),
        })?;
        let seen = state.consumed.get(alias).copied().unwrap_or(0);
        let next = log.iter().filter(|r| route.matches(r)).nth(seen).cloned();
        if next.is_some() {
            state.consumed.insert(alias.to_string(), seen + 1);
        }
        Ok(next)
    }

    /// Requests in `log` that match `alias`
    pub fn matching(&self, alias: &str, log: &[CapturedRequest]) -> CheckResult<Vec<CapturedRequest>> {
        let route = self.route(alias)?;
        Ok(log.iter().filter(|r| route.matches(r)).cloned().collect())
    }

    /// Forget all routes
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.routes.clear();
        state.consumed.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod pattern_tests {
        use super::*;

        #[test]
        fn test_glob_segments() {
            let p = UrlPattern::parse("**/api/*");
            assert!(p.matches("https://shop.test/api/productsList"));
            assert!(!p.matches("https://shop.test/api/v2/productsList"));
            let deep = UrlPattern::parse("**/api/**");
            assert!(deep.matches("https://shop.test/api/v2/productsList"));
        }

        #[test]
        fn test_glob_escapes_literals() {
            let p = UrlPattern::parse("https://shop.test/view_cart?*");
            assert!(p.matches("https://shop.test/view_cart?x=1"));
            assert!(!p.matches("https://shopXtest/view_cart?x=1"));
        }

        #[test]
        fn test_plain_text_is_substring() {
            let p = UrlPattern::parse("/productsList");
            assert!(p.matches("https://shop.test/api/productsList"));
            assert!(UrlPattern::parse("*").matches("anything"));
        }

        #[test]
        fn test_regex_pattern() {
            let p = UrlPattern::regex(r"/product_details/\d+$").unwrap();
            assert!(p.matches("https://shop.test/product_details/12"));
            assert!(UrlPattern::regex("(").is_err());
        }
    }

    mod method_tests {
        use super::*;

        #[test]
        fn test_parse_and_any() {
            assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
            assert!(HttpMethod::Any.matches(&HttpMethod::Delete));
            assert!(!HttpMethod::Get.matches(&HttpMethod::Post));
            assert!("FETCH".parse::<HttpMethod>().is_err());
        }
    }

    mod interception_tests {
        use super::*;

        fn log() -> Vec<CapturedRequest> {
            vec![
                CapturedRequest::new(HttpMethod::Get, "https://shop.test/"),
                CapturedRequest::new(HttpMethod::Get, "https://shop.test/api/productsList"),
                CapturedRequest::new(HttpMethod::Post, "https://shop.test/api/searchProduct"),
                CapturedRequest::new(HttpMethod::Get, "https://shop.test/api/productsList"),
            ]
        }

        #[test]
        fn test_each_wait_consumes_one_request() {
            let net = NetworkInterception::new();
            net.intercept(Route::new(HttpMethod::Get, UrlPattern::parse("**/productsList"), "products"));
            let log = log();
            assert!(net.take_next("products", &log).unwrap().is_some());
            assert!(net.take_next("products", &log).unwrap().is_some());
            assert!(net.take_next("products", &log).unwrap().is_none());
        }

        #[test]
        fn test_reintercept_resets_consumption() {
            let net = NetworkInterception::new();
            let route = Route::new(HttpMethod::Post, UrlPattern::parse("searchProduct"), "search");
            net.intercept(route.clone());
            assert!(net.take_next("search", &log()).unwrap().is_some());
            net.intercept(route);
            assert!(net.take_next("search", &log()).unwrap().is_some());
        }

        #[test]
        fn test_unknown_alias() {
            let net = NetworkInterception::new();
            let err = net.take_next("missing", &log()).unwrap_err();
            assert!(matches!(err, CheckError::Config { .. }));
            assert!(!net.has_alias("missing"));
        }

        #[test]
        fn test_clones_share_routes() {
            let net = NetworkInterception::new();
            let other = net.clone();
            net.intercept(Route::new(HttpMethod::Any, UrlPattern::Any, "all"));
            assert_eq!(other.matching("all", &log()).unwrap().len(), 4);
            other.clear();
            assert!(!net.has_alias("all"));
        }
    }
}
