//! Storecheck: declarative UI-interaction and HTTP-assertion DSL for
//! storefront end-to-end tests.
//!
//! Scenarios drive a [`BrowserSession`] through named selectors, page
//! objects and a registry of reusable commands, and assert on the
//! storefront's JSON API directly.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     STORECHECK Architecture                       │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────┐              │
//! │  │ Scenario   │──►│ Commands /  │──►│ BrowserDriver│──► chromium  │
//! │  │ (Suite)    │   │ Page Objects│   │ (mock | CDP) │              │
//! │  └─────┬──────┘   └─────────────┘   └──────────────┘              │
//! │        │          ┌─────────────┐                                 │
//! │        └─────────►│ ApiClient   │─────────────────────► JSON API  │
//! │                   └─────────────┘                                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storecheck::{BrowserDriver, MockDriver, Suite, SuiteConfig};
//! use serde_json::json;
//!
//! # async fn demo() {
//! let mut suite = Suite::new("smoke", SuiteConfig::new(), || {
//!     Arc::new(MockDriver::new()) as Arc<dyn BrowserDriver>
//! });
//! suite
//!     .run("products page", |s| async move {
//!         s.invoke("navigate_to", vec![json!("products")]).await?;
//!         s.session.expect_url_contains("/products").await?;
//!         Ok(())
//!     })
//!     .await;
//! println!("{}", suite.finish().summary());
//! # }
//! ```

#![warn(missing_docs)]

mod config;
#[allow(clippy::missing_const_for_fn, clippy::doc_markdown)]
mod context;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod locator;
mod network;
#[allow(clippy::missing_errors_doc)]
mod page_object;
mod result;
mod retry;
#[allow(clippy::missing_errors_doc)]
mod wait;

/// HTTP assertions against the storefront JSON API
pub mod api;

/// Chrome DevTools Protocol driver
#[cfg(feature = "browser")]
#[allow(clippy::needless_raw_string_hashes, clippy::significant_drop_tightening)]
pub mod cdp;

/// Navigation, cart and API commands and the registry that names them
#[allow(missing_docs)]
pub mod commands;

/// Random and unique test data
#[allow(missing_docs)]
pub mod datagen;

/// JSON fixtures and named data tasks
#[allow(missing_docs)]
pub mod fixture;

/// Small parsing and comparison helpers
pub mod helpers;

/// Tracing subscriber setup
pub mod logging;

/// Home and cart page objects
#[allow(missing_docs)]
pub mod pages;

/// Scenario runner and reporting
#[allow(missing_docs)]
pub mod suite;

#[cfg(test)]
#[allow(missing_docs, clippy::unwrap_used, clippy::expect_used, dead_code)]
mod test_support;

pub use config::{
    Credentials, Endpoints, Environment, SuiteConfig, UserKind, Viewport,
    DEFAULT_BASE_URL, DEFAULT_COMMAND_TIMEOUT_MS,
};
pub use context::{BrowserSession, StorageState};
pub use driver::{
    BoundingBox, BrowserDriver, Cookie, DriverEvent, ElementHandle, MockDom, MockDriver, MockHook,
    NodeId, Screenshot, ScrollPosition, StorageArea,
};
pub use locator::{Selector, SelectorMap};
pub use network::{CapturedRequest, HttpMethod, NetworkInterception, Route, UrlPattern};
pub use page_object::{PageObject, SimplePage, Target};
pub use result::{CheckError, CheckResult};
pub use retry::{retry, retry_check, retry_if, verify_text_with_retry, RetryPolicy};
pub use suite::{Scenario, ScenarioResult, ScenarioStatus, Suite, SuiteReport};
pub use wait::{
    fixed_delay, settle_after, wait_for_attribute, wait_for_count, wait_for_elements, wait_for_exists,
    wait_for_hidden, wait_for_text, wait_for_url, wait_for_value, wait_for_visible, wait_until,
    SettlePolicy, WaitOptions, DEFAULT_POLL_INTERVAL_MS,
};
