//! Page Object Model.
//!
//! A page object owns a URL, a [`SelectorMap`] and a [`BrowserSession`].
//! [`PageObject`] supplies every element primitive as a default method
//! that returns the same page, so steps compose in one expression:
//!
//! ```ignore
//! home.visit().await?
//!     .click("productsLink").await?
//!     .verify_visible("featuresSection").await?;
//! ```
//!
//! Targets are either a key of the page's own map or a composed
//! [`Selector`]; a page never reaches into another page's selectors.

use crate::context::BrowserSession;
use crate::driver::Cookie;
use crate::locator::{Selector, SelectorMap};
use crate::network::HttpMethod;
use crate::result::{CheckError, CheckResult};
use async_trait::async_trait;

/// Something a page can turn into a selector
pub trait Target {
    /// Resolve against the page's selector map
    fn to_selector(&self, map: &SelectorMap) -> Selector;
}

impl Target for &str {
    fn to_selector(&self, map: &SelectorMap) -> Selector {
        map.resolve(self)
    }
}

impl Target for Selector {
    fn to_selector(&self, _map: &SelectorMap) -> Selector {
        self.clone()
    }
}

impl Target for &Selector {
    fn to_selector(&self, _map: &SelectorMap) -> Selector {
        (*self).clone()
    }
}

/// Base behavior shared by all pages
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Path of the page relative to the base URL
    fn url(&self) -> &str;

    /// The page's selector map
    fn selectors(&self) -> &SelectorMap;

    /// Session the page acts through
    fn session(&self) -> &BrowserSession;

    /// Name used in logs
    fn page_name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("page")
    }

    /// Resolve a key of this page's map
    fn sel(&self, key: &str) -> Selector {
        self.selectors().resolve(key)
    }

    /// Whether the browser currently shows this page
    async fn is_loaded(&self) -> CheckResult<bool> {
        let url = self.session().current_url().await?;
        Ok(url.contains(self.url()))
    }

    /// Open the page
    async fn visit(&self) -> CheckResult<&Self> {
        tracing::info!(page = self.page_name(), "open page");
        self.session().visit(self.url()).await?;
        Ok(self)
    }

    /// Document title
    async fn title(&self) -> CheckResult<String> {
        self.session().title().await
    }

    /// Current URL
    async fn current_url(&self) -> CheckResult<String> {
        self.session().current_url().await
    }

    /// Body visible and document complete
    async fn wait_for_page_load(&self) -> CheckResult<&Self> {
        self.session().wait_for_page_load().await?;
        Ok(self)
    }

    /// Wait for a target to be visible under a custom budget
    async fn wait_for_element<T: Target + Send>(&self, target: T, timeout_ms: u64) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().wait_for_element(&selector, timeout_ms).await?;
        Ok(self)
    }

    /// Click a target
    async fn click<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().click(&selector).await?;
        Ok(self)
    }

    /// Clear a target and type into it
    async fn type_text<T: Target + Send>(&self, target: T, text: &str) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().type_text(&selector, text).await?;
        Ok(self)
    }

    /// Choose an option
    async fn select_option<T: Target + Send>(&self, target: T, option: &str) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().select_option(&selector, option).await?;
        Ok(self)
    }

    /// Check a checkbox
    async fn check<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().check(&selector).await?;
        Ok(self)
    }

    /// Target exists
    async fn verify_exists<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().verify_exists(&selector).await?;
        Ok(self)
    }

    /// Target is visible
    async fn verify_visible<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().verify_visible(&selector).await?;
        Ok(self)
    }

    /// Target is absent or hidden
    async fn verify_not_visible<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().verify_not_visible(&selector).await?;
        Ok(self)
    }

    /// Target's text contains `text`
    async fn verify_contains_text<T: Target + Send>(&self, target: T, text: &str) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().verify_contains_text(&selector, text).await?;
        Ok(self)
    }

    /// Target's attribute equals `value`
    async fn verify_has_attribute<T: Target + Send>(
        &self,
        target: T,
        attribute: &str,
        value: &str,
    ) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session()
            .verify_has_attribute(&selector, attribute, value)
            .await?;
        Ok(self)
    }

    /// Scroll a target into view
    async fn scroll_to_element<T: Target + Send>(&self, target: T) -> CheckResult<&Self> {
        let selector = target.to_selector(self.selectors());
        self.session().scroll_into_view(&selector).await?;
        Ok(self)
    }

    /// Scroll to the top of the document
    async fn scroll_to_top(&self) -> CheckResult<&Self> {
        self.session().scroll_to_top().await?;
        Ok(self)
    }

    /// Scroll to the bottom of the document
    async fn scroll_to_bottom(&self) -> CheckResult<&Self> {
        self.session().scroll_to_bottom().await?;
        Ok(self)
    }

    /// Save a screenshot named `name`
    async fn take_screenshot(&self, name: &str) -> CheckResult<&Self> {
        self.session().take_screenshot(name).await?;
        Ok(self)
    }

    /// Constant delay; prefer a verification
    async fn wait(&self, ms: u64) -> CheckResult<&Self> {
        self.session().wait(ms).await?;
        Ok(self)
    }

    /// Set a cookie
    async fn set_cookie(&self, name: &str, value: &str) -> CheckResult<&Self> {
        self.session().set_cookie(name, value).await?;
        Ok(self)
    }

    /// Cookie by name
    async fn get_cookie(&self, name: &str) -> CheckResult<Option<Cookie>> {
        self.session().cookie(name).await
    }

    /// Remove all cookies
    async fn clear_cookies(&self) -> CheckResult<&Self> {
        self.session().clear_cookies().await?;
        Ok(self)
    }

    /// Set a `localStorage` item
    async fn set_local_storage(&self, key: &str, value: &str) -> CheckResult<&Self> {
        self.session().set_local_storage(key, value).await?;
        Ok(self)
    }

    /// `localStorage` item
    async fn get_local_storage(&self, key: &str) -> CheckResult<Option<String>> {
        self.session().local_storage(key).await
    }

    /// Empty `localStorage`
    async fn clear_local_storage(&self) -> CheckResult<&Self> {
        self.session().clear_local_storage().await?;
        Ok(self)
    }

    /// Answer browser dialogs automatically
    async fn handle_alert(&self, accept: bool) -> CheckResult<&Self> {
        self.session().handle_alert(accept).await?;
        Ok(self)
    }

    /// Register an aliased route
    async fn intercept_request(&self, method: HttpMethod, url: &str, alias: &str) -> CheckResult<&Self> {
        self.session().intercept(method, url, alias).await?;
        Ok(self)
    }

    /// Wait for the next request on an alias
    async fn wait_for_request(&self, alias: &str) -> CheckResult<&Self> {
        self.session().wait_for_request(alias).await?;
        Ok(self)
    }
}

/// Page built at runtime from a URL and selector pairs
#[derive(Debug, Clone)]
pub struct SimplePage {
    url: String,
    selectors: SelectorMap,
    session: BrowserSession,
}

impl SimplePage {
    /// Create a page
    pub fn new<I, K, V>(session: BrowserSession, url: impl Into<String>, pairs: I) -> CheckResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Selector>,
    {
        Ok(Self {
            url: url.into(),
            selectors: SelectorMap::from_pairs(pairs)?,
            session,
        })
    }
}

impl PageObject for SimplePage {
    fn url(&self) -> &str {
        &self.url
    }

    fn selectors(&self) -> &SelectorMap {
        &self.selectors
    }

    fn session(&self) -> &BrowserSession {
        &self.session
    }
}

/// Fail with a uniform message when a page-level expectation is violated
pub(crate) fn expect(condition: bool, message: impl FnOnce() -> String) -> CheckResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::assertion(message()))
    }
}
