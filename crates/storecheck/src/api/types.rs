//! Response model and body checks.

use crate::result::{CheckError, CheckResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

static PRICE: OnceLock<Option<Regex>> = OnceLock::new();

/// Decoded HTTP response
///
/// `status` is the transport status; the API's own `responseCode` lives in
/// the body and is checked separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: BTreeMap<String, String>,
    /// Body as JSON
    pub body: Value,
}

/// Parse a raw body into JSON
///
/// Some endpoints answer with JSON wrapped in a JSON string, or with a
/// non-JSON content type; both decode to the inner document. An empty body
/// is `null`. Anything else is a [`CheckError::Transport`].
pub fn decode_body(raw: &str, status: u16) -> CheckResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    let undecodable = |e: serde_json::Error| CheckError::Transport {
        message: format!("response body is not JSON: {e}"),
        status: Some(status),
    };
    let value: Value = serde_json::from_str(trimmed).map_err(undecodable)?;
    match value {
        Value::String(inner) if looks_like_json(&inner) => {
            serde_json::from_str(&inner).map_err(undecodable)
        }
        other => Ok(other),
    }
}

fn looks_like_json(s: &str) -> bool {
    let s = s.trim_start();
    s.starts_with('{') || s.starts_with('[')
}

impl ApiResponse {
    /// Build from a status, headers and a raw body
    pub fn from_parts(status: u16, headers: BTreeMap<String, String>, raw: &str) -> CheckResult<Self> {
        Ok(Self {
            status,
            headers,
            body: decode_body(raw, status)?,
        })
    }

    /// The body's `responseCode`, when present and numeric
    #[must_use]
    pub fn response_code(&self) -> Option<i64> {
        self.body.get("responseCode").and_then(Value::as_i64)
    }

    /// Transport status equals `expected`
    pub fn require_status(&self, expected: u16) -> CheckResult<&Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(CheckError::assertion(format!(
                "expected HTTP status {expected}, got {}",
                self.status
            )))
        }
    }

    /// Body carries a `responseCode` field
    pub fn require_response_code(&self) -> CheckResult<&Self> {
        if self.body.get("responseCode").is_some() {
            Ok(self)
        } else {
            Err(CheckError::assertion(format!(
                "response body has no responseCode: {}",
                preview(&self.body)
            )))
        }
    }

    /// Body deserialized into `T`
    pub fn typed<T: DeserializeOwned>(&self) -> CheckResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| CheckError::Transport {
            message: format!("unexpected body shape: {e}"),
            status: Some(self.status),
        })
    }

    /// Body as a product list
    pub fn products(&self) -> CheckResult<ProductsBody> {
        self.typed()
    }

    /// Body as a brand list
    pub fn brands(&self) -> CheckResult<BrandsBody> {
        self.typed()
    }

    /// Check status, properties, `responseCode` and data presence
    pub fn validate(&self, expected: &ExpectedStructure) -> CheckResult<&Self> {
        if let Some(status) = expected.status_code {
            self.require_status(status)?;
        }
        for property in &expected.properties {
            if self.body.get(property).is_none() {
                return Err(CheckError::assertion(format!(
                    "expected body to have property {property:?}"
                )));
            }
        }
        if let Some(code) = expected.response_code {
            let actual = self.response_code();
            if actual != Some(code) {
                return Err(CheckError::assertion(format!(
                    "expected responseCode {code}, got {actual:?}"
                )));
            }
        }
        if expected.has_data && !self.body.get("products").is_some_and(Value::is_array) {
            return Err(CheckError::assertion("expected body to have a products array"));
        }
        Ok(self)
    }
}

fn preview(body: &Value) -> String {
    let text = body.to_string();
    if text.len() > 120 {
        let cut = (0..=120).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text
    }
}

/// What [`ApiResponse::validate`] checks; unset parts are skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpectedStructure {
    /// HTTP status
    pub status_code: Option<u16>,
    /// Top-level body properties that must exist
    pub properties: Vec<String>,
    /// Exact `responseCode`
    pub response_code: Option<i64>,
    /// Body has a `products` array
    pub has_data: bool,
}

impl ExpectedStructure {
    /// Nothing expected yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect an HTTP status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Expect a top-level property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    /// Expect a `responseCode`
    #[must_use]
    pub const fn with_response_code(mut self, code: i64) -> Self {
        self.response_code = Some(code);
        self
    }

    /// Expect a `products` array
    #[must_use]
    pub const fn with_data(mut self) -> Self {
        self.has_data = true;
        self
    }
}

/// `usertype` wrapper inside a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    /// Women, Men or Kids
    pub usertype: String,
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Audience
    pub usertype: UserType,
    /// Category name
    pub category: String,
}

/// One catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Price text, `Rs. <digits>`
    pub price: String,
    /// Brand name
    pub brand: String,
    /// Category
    pub category: Category,
}

/// One brand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    /// Brand id
    pub id: u64,
    /// Brand name
    pub brand: String,
}

/// Body of the product list and search endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsBody {
    /// API status, independent of the HTTP status
    pub response_code: i64,
    /// Products, absent on error answers
    #[serde(default)]
    pub products: Vec<Product>,
    /// Error text on error answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of the brand list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandsBody {
    /// API status
    pub response_code: i64,
    /// Brands
    #[serde(default)]
    pub brands: Vec<Brand>,
    /// Error text on error answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ids that occur more than once, in first-repeat order
#[must_use]
pub fn duplicate_ids(ids: impl IntoIterator<Item = u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut dupes = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            dupes.push(id);
        }
    }
    dupes
}

/// Price text of the form `Rs. <digits>`
#[must_use]
pub fn is_valid_price(price: &str) -> bool {
    PRICE
        .get_or_init(|| Regex::new(r"^Rs\. \d+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(price))
}

impl ProductsBody {
    /// Ids that appear more than once
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<u64> {
        duplicate_ids(self.products.iter().map(|p| p.id))
    }

    /// Every product has a name, brand and category, a well-formed price,
    /// and a unique id
    pub fn verify_well_formed(&self) -> CheckResult<()> {
        for p in &self.products {
            if p.name.trim().is_empty() || p.brand.trim().is_empty() || p.category.category.trim().is_empty() {
                return Err(CheckError::assertion(format!("product {} has empty fields", p.id)));
            }
            if !is_valid_price(&p.price) {
                return Err(CheckError::assertion(format!(
                    "product {} price {:?} is not 'Rs. <digits>'",
                    p.id, p.price
                )));
            }
        }
        let dupes = self.duplicate_ids();
        if dupes.is_empty() {
            Ok(())
        } else {
            Err(CheckError::assertion(format!("duplicate product ids: {dupes:?}")))
        }
    }
}

impl BrandsBody {
    /// Ids that appear more than once
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<u64> {
        duplicate_ids(self.brands.iter().map(|b| b.id))
    }
}
