//! HTTP client for the storefront JSON API.

use super::types::{ApiResponse, BrandsBody, ProductsBody};
use crate::config::{Endpoints, SuiteConfig};
use crate::network::HttpMethod;
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    /// JSON document
    Json(Value),
}

/// One API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Method; `Any` is rejected
    pub method: HttpMethod,
    /// Path relative to the API URL, or an absolute URL
    pub endpoint: String,
    /// Payload; never sent with GET
    #[serde(default)]
    pub body: Option<RequestBody>,
    /// Extra headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Request without a body
    #[must_use]
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// GET request
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    /// POST request
    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    /// Attach form fields
    #[must_use]
    pub fn with_form<K: Into<String>, V: Into<String>>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self {
        self.body = Some(RequestBody::Form(
            fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ));
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn to_reqwest(method: HttpMethod) -> CheckResult<reqwest::Method> {
    Ok(match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Any => {
            return Err(CheckError::Config {
                message: "a concrete HTTP method is required for an API request".to_string(),
            })
        }
    })
}

/// Client for the product, brand and search endpoints
///
/// Non-2xx statuses are returned as responses, never as errors; only
/// transport failures and undecodable bodies fail [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    api_url: String,
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl ApiClient {
    /// Client with the configured request and response timeouts
    pub fn new(config: &SuiteConfig) -> CheckResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.request_timeout_ms))
            .timeout(Duration::from_millis(config.response_timeout_ms))
            .build()
            .map_err(|e| CheckError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Client over a caller-built `reqwest::Client`
    #[must_use]
    pub fn with_client(config: &SuiteConfig, client: reqwest::Client) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            client,
        }
    }

    /// API root
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.api_url)
        } else {
            format!("{}/{endpoint}", self.api_url)
        }
    }

    /// Send a request and decode the body
    pub async fn request(&self, request: &ApiRequest) -> CheckResult<ApiResponse> {
        let method = to_reqwest(request.method)?;
        let url = self.url(&request.endpoint);
        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method != HttpMethod::Get {
            builder = match &request.body {
                Some(RequestBody::Form(fields)) => builder.form(fields),
                Some(RequestBody::Json(value)) => builder.json(value),
                None => builder,
            };
        }

        let started = Instant::now();
        let resp = builder.send().await.map_err(|e| CheckError::Transport {
            message: format!("{} {url}: {e}", request.method),
            status: e.status().map(|s| s.as_u16()),
        })?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let raw = resp.text().await.map_err(|e| CheckError::Transport {
            message: format!("failed to read body of {url}: {e}"),
            status: Some(status),
        })?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(method = %request.method, %url, status, elapsed_ms, "api request");
        ApiResponse::from_parts(status, headers, &raw)
    }

    /// GET the product list; HTTP 200 and a `responseCode` are required
    pub async fn get_products(&self) -> CheckResult<ProductsBody> {
        let resp = self.request(&ApiRequest::get(self.endpoints.products.clone())).await?;
        resp.require_status(200)?.require_response_code()?;
        resp.products()
    }

    /// GET the brand list; HTTP 200 and a `responseCode` are required
    pub async fn get_brands(&self) -> CheckResult<BrandsBody> {
        let resp = self.request(&ApiRequest::get(self.endpoints.brands.clone())).await?;
        resp.require_status(200)?.require_response_code()?;
        resp.brands()
    }

    /// POST a search with form field `search_product`
    pub async fn search_products(&self, term: &str) -> CheckResult<ProductsBody> {
        let req = ApiRequest::post(self.endpoints.search_product.clone())
            .with_form([("search_product", term)]);
        let resp = self.request(&req).await?;
        resp.require_status(200)?;
        resp.products()
    }
}
