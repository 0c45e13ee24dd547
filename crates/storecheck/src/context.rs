//! Browser session and element action primitives.
//!
//! [`BrowserSession`] is the handle every page object and command acts
//! through. Each primitive waits for its target under the configured
//! budget, acts, and hands back `&Self` so steps chain.

use crate::config::{SuiteConfig, Viewport};
use crate::driver::{BrowserDriver, Cookie, ElementHandle, ScrollPosition, StorageArea};
use crate::locator::Selector;
use crate::network::{CapturedRequest, HttpMethod, NetworkInterception, Route, UrlPattern};
use crate::result::{CheckError, CheckResult};
use crate::wait::{self, WaitOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Cookies and web storage of a page, for backup and restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageState {
    /// Cookies
    pub cookies: Vec<Cookie>,
    /// `localStorage` entries
    pub local_storage: BTreeMap<String, String>,
    /// `sessionStorage` entries
    pub session_storage: BTreeMap<String, String>,
}

impl StorageState {
    /// Create empty storage state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add a local storage item
    #[must_use]
    pub fn with_local_storage(mut self, key: &str, value: &str) -> Self {
        self.local_storage.insert(key.to_string(), value.to_string());
        self
    }

    /// Check if storage is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty() && self.session_storage.is_empty()
    }

    /// Write as pretty JSON
    pub fn save(&self, path: &Path) -> CheckResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read from JSON
    pub fn load(path: &Path) -> CheckResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Handle to one browsing context plus suite configuration
///
/// Clones share the driver and the interception table.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    driver: Arc<dyn BrowserDriver>,
    config: Arc<SuiteConfig>,
    network: NetworkInterception,
}

impl BrowserSession {
    /// Create a session over a driver
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, config: SuiteConfig) -> Self {
        Self {
            driver,
            config: Arc::new(config),
            network: NetworkInterception::new(),
        }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Interception table
    #[must_use]
    pub fn network(&self) -> &NetworkInterception {
        &self.network
    }

    /// Default element wait
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new().with_timeout(self.config.timeout_ms)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Open a path relative to the base URL, or an absolute URL
    pub async fn visit(&self, path: &str) -> CheckResult<&Self> {
        let url = self.config.page_url(path);
        info!(%url, "visit");
        self.driver.navigate(&url).await?;
        self.wait_for_ready_state().await?;
        Ok(self)
    }

    /// Current URL
    pub async fn current_url(&self) -> CheckResult<String> {
        self.driver.current_url().await
    }

    /// Document title
    pub async fn title(&self) -> CheckResult<String> {
        self.driver.title().await
    }

    /// Wait until the URL contains `fragment`
    pub async fn expect_url_contains(&self, fragment: &str) -> CheckResult<&Self> {
        wait::wait_for_url(self.driver(), fragment, &self.wait_options())
            .await
            .map_err(|e| match e {
                CheckError::TimeoutExceeded { ms, .. } => CheckError::assertion(format!(
                    "expected URL to include {fragment:?} within {ms}ms"
                )),
                other => other,
            })?;
        Ok(self)
    }

    /// Assert the URL does not contain `fragment`
    pub async fn expect_url_excludes(&self, fragment: &str) -> CheckResult<&Self> {
        let url = self.current_url().await?;
        if url.contains(fragment) {
            return Err(CheckError::assertion(format!(
                "expected URL {url:?} not to include {fragment:?}"
            )));
        }
        Ok(self)
    }

    async fn wait_for_ready_state(&self) -> CheckResult<()> {
        let options = WaitOptions::new().with_timeout(self.config.page_load_timeout_ms);
        let driver = self.driver();
        wait::wait_until("document ready", &options, || async move {
            Ok::<_, CheckError>((driver.ready_state().await? == "complete").then_some(()))
        })
        .await
    }

    /// Body visible and document complete
    pub async fn wait_for_page_load(&self) -> CheckResult<&Self> {
        self.verify_visible(&Selector::css("body")).await?;
        self.wait_for_ready_state().await?;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Element actions
    // ---------------------------------------------------------------------

    /// Click the target once it is visible
    pub async fn click(&self, selector: &Selector) -> CheckResult<&Self> {
        debug!(%selector, "click");
        let visible = selector.clone().visible();
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.click(&visible).await?;
        Ok(self)
    }

    /// Clear the target, then type `text`
    pub async fn type_text(&self, selector: &Selector, text: &str) -> CheckResult<&Self> {
        debug!(%selector, len = text.len(), "type");
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.clear(selector).await?;
        self.driver.type_text(selector, text).await?;
        Ok(self)
    }

    /// Type without clearing first
    pub async fn append_text(&self, selector: &Selector, text: &str) -> CheckResult<&Self> {
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.type_text(selector, text).await?;
        Ok(self)
    }

    /// Clear the target's value
    pub async fn clear(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.clear(selector).await?;
        Ok(self)
    }

    /// Blur the target
    pub async fn blur(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_exists(self.driver(), selector, &self.wait_options()).await?;
        self.driver.blur(selector).await?;
        Ok(self)
    }

    /// Choose an option
    pub async fn select_option(&self, selector: &Selector, option: &str) -> CheckResult<&Self> {
        debug!(%selector, option, "select");
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.select_option(selector, option).await?;
        Ok(self)
    }

    /// Check a checkbox or radio
    pub async fn check(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        self.driver.check(selector).await?;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Verifications
    // ---------------------------------------------------------------------

    /// At least one match exists
    pub async fn verify_exists(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_exists(self.driver(), selector, &self.wait_options()).await?;
        Ok(self)
    }

    /// At least one match is visible
    pub async fn verify_visible(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_visible(self.driver(), selector, &self.wait_options()).await?;
        Ok(self)
    }

    /// No match is visible
    pub async fn verify_not_visible(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_hidden(self.driver(), selector, &self.wait_options()).await?;
        Ok(self)
    }

    /// Some match's text contains `text`
    pub async fn verify_contains_text(&self, selector: &Selector, text: &str) -> CheckResult<&Self> {
        wait::wait_for_text(self.driver(), selector, text, &self.wait_options()).await?;
        Ok(self)
    }

    /// First match has `attribute` equal to `value`
    pub async fn verify_has_attribute(
        &self,
        selector: &Selector,
        attribute: &str,
        value: &str,
    ) -> CheckResult<&Self> {
        wait::wait_for_attribute(self.driver(), selector, attribute, value, &self.wait_options())
            .await?;
        Ok(self)
    }

    /// First match has form value `value`
    pub async fn verify_value(&self, selector: &Selector, value: &str) -> CheckResult<&Self> {
        wait::wait_for_value(self.driver(), selector, value, &self.wait_options()).await?;
        Ok(self)
    }

    /// Match count satisfies `accept`
    pub async fn verify_count<P>(
        &self,
        selector: &Selector,
        expectation: &str,
        accept: P,
    ) -> CheckResult<usize>
    where
        P: Fn(usize) -> bool + Send,
    {
        wait::wait_for_count(self.driver(), selector, &self.wait_options(), expectation, accept).await
    }

    /// Wait for the target to be visible under a custom budget
    pub async fn wait_for_element(&self, selector: &Selector, timeout_ms: u64) -> CheckResult<&Self> {
        let options = self.wait_options().with_timeout(timeout_ms);
        wait::wait_for_visible(self.driver(), selector, &options).await?;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Matches right now, without waiting
    pub async fn query_now(&self, selector: &Selector) -> CheckResult<Vec<ElementHandle>> {
        self.driver.query_all(selector).await
    }

    /// Whether anything matches right now
    pub async fn exists_now(&self, selector: &Selector) -> CheckResult<bool> {
        Ok(!self.driver.query_all(selector).await?.is_empty())
    }

    /// Matches once at least one exists
    pub async fn elements(&self, selector: &Selector) -> CheckResult<Vec<ElementHandle>> {
        wait::wait_for_exists(self.driver(), selector, &self.wait_options()).await
    }

    /// Trimmed text of the first match
    pub async fn text(&self, selector: &Selector) -> CheckResult<String> {
        let found = self.elements(selector).await?;
        Ok(found
            .first()
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default())
    }

    /// Value of the first match
    pub async fn value(&self, selector: &Selector) -> CheckResult<String> {
        let found = self.elements(selector).await?;
        Ok(found
            .first()
            .and_then(|e| e.value.clone())
            .unwrap_or_default())
    }

    /// Number of matches right now
    pub async fn count(&self, selector: &Selector) -> CheckResult<usize> {
        Ok(self.driver.query_all(selector).await?.len())
    }

    // ---------------------------------------------------------------------
    // Scrolling, screenshots, delays
    // ---------------------------------------------------------------------

    /// Scroll the target into view
    pub async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<&Self> {
        wait::wait_for_exists(self.driver(), selector, &self.wait_options()).await?;
        self.driver.scroll_into_view(selector).await?;
        Ok(self)
    }

    /// Scroll the window to the top
    pub async fn scroll_to_top(&self) -> CheckResult<&Self> {
        self.driver.scroll_to(ScrollPosition::Top).await?;
        Ok(self)
    }

    /// Scroll the window to the bottom
    pub async fn scroll_to_bottom(&self) -> CheckResult<&Self> {
        self.driver.scroll_to(ScrollPosition::Bottom).await?;
        Ok(self)
    }

    /// Save a PNG as `<screenshots_dir>/<name>.png`
    pub async fn capture_screenshot(&self, name: &str) -> CheckResult<PathBuf> {
        let shot = self.driver.screenshot().await?;
        let dir = &self.config.screenshots_dir;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{name}.png"));
        tokio::fs::write(&path, &shot.data).await?;
        info!(path = %path.display(), "screenshot saved");
        Ok(path)
    }

    /// Save a screenshot, chaining
    pub async fn take_screenshot(&self, name: &str) -> CheckResult<&Self> {
        self.capture_screenshot(name).await?;
        Ok(self)
    }

    /// Sleep for a constant time
    ///
    /// Prefer a condition; see [`wait::fixed_delay`].
    pub async fn wait(&self, ms: u64) -> CheckResult<&Self> {
        wait::fixed_delay(ms).await;
        Ok(self)
    }

    /// Resize the viewport
    pub async fn set_viewport(&self, viewport: Viewport) -> CheckResult<&Self> {
        self.driver.set_viewport(viewport).await?;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Cookies and storage
    // ---------------------------------------------------------------------

    /// Set a cookie for the current host
    pub async fn set_cookie(&self, name: &str, value: &str) -> CheckResult<&Self> {
        self.driver.set_cookie(Cookie::new(name, value)).await?;
        Ok(self)
    }

    /// Cookie by name
    pub async fn cookie(&self, name: &str) -> CheckResult<Option<Cookie>> {
        Ok(self
            .driver
            .cookies()
            .await?
            .into_iter()
            .find(|c| c.name == name))
    }

    /// Remove every cookie
    pub async fn clear_cookies(&self) -> CheckResult<&Self> {
        self.driver.clear_cookies().await?;
        Ok(self)
    }

    /// Set a `localStorage` item
    pub async fn set_local_storage(&self, key: &str, value: &str) -> CheckResult<&Self> {
        self.driver
            .set_storage_item(StorageArea::Local, key, value)
            .await?;
        Ok(self)
    }

    /// `localStorage` item by key
    pub async fn local_storage(&self, key: &str) -> CheckResult<Option<String>> {
        Ok(self
            .driver
            .storage_entries(StorageArea::Local)
            .await?
            .remove(key))
    }

    /// Empty `localStorage`
    pub async fn clear_local_storage(&self) -> CheckResult<&Self> {
        self.driver.clear_storage(StorageArea::Local).await?;
        Ok(self)
    }

    /// Empty `sessionStorage`
    pub async fn clear_session_storage(&self) -> CheckResult<&Self> {
        self.driver.clear_storage(StorageArea::Session).await?;
        Ok(self)
    }

    /// Cookies, local and session storage
    pub async fn clear_browser_data(&self) -> CheckResult<&Self> {
        self.clear_cookies().await?;
        self.clear_local_storage().await?;
        self.clear_session_storage().await?;
        Ok(self)
    }

    /// Snapshot cookies and storage
    pub async fn storage_state(&self) -> CheckResult<StorageState> {
        Ok(StorageState {
            cookies: self.driver.cookies().await?,
            local_storage: self.driver.storage_entries(StorageArea::Local).await?,
            session_storage: self.driver.storage_entries(StorageArea::Session).await?,
        })
    }

    /// Write cookies and storage to `path`
    pub async fn backup_state(&self, path: &Path) -> CheckResult<&Self> {
        let state = self.storage_state().await?;
        state.save(path)?;
        info!(path = %path.display(), cookies = state.cookies.len(), "state backed up");
        Ok(self)
    }

    /// Re-apply cookies and storage from `path`
    pub async fn restore_state(&self, path: &Path) -> CheckResult<&Self> {
        let state = StorageState::load(path)?;
        for cookie in state.cookies {
            self.driver.set_cookie(cookie).await?;
        }
        for (key, value) in &state.local_storage {
            self.driver
                .set_storage_item(StorageArea::Local, key, value)
                .await?;
        }
        for (key, value) in &state.session_storage {
            self.driver
                .set_storage_item(StorageArea::Session, key, value)
                .await?;
        }
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Dialogs and network
    // ---------------------------------------------------------------------

    /// Answer `alert`/`confirm` automatically
    pub async fn handle_alert(&self, accept: bool) -> CheckResult<&Self> {
        self.driver.stub_dialogs(accept).await?;
        Ok(self)
    }

    /// Register an aliased route
    pub async fn intercept(&self, method: HttpMethod, url: &str, alias: &str) -> CheckResult<&Self> {
        debug!(%method, url, alias, "intercept");
        self.network
            .intercept(Route::new(method, UrlPattern::parse(url), alias));
        Ok(self)
    }

    /// Wait for the next request matching an alias and return it
    pub async fn next_request(&self, alias: &str) -> CheckResult<CapturedRequest> {
        let options = WaitOptions::new().with_timeout(self.config.request_timeout_ms);
        let what = format!("request @{alias}");
        let driver = self.driver();
        let network = &self.network;
        wait::wait_until(&what, &options, || async move {
            let log = driver.network_log().await?;
            network.take_next(alias, &log)
        })
        .await
    }

    /// Wait for the next request matching an alias
    pub async fn wait_for_request(&self, alias: &str) -> CheckResult<&Self> {
        self.next_request(alias).await?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDom, MockDriver};

    fn session_with(dom: MockDom) -> (Arc<MockDriver>, BrowserSession) {
        let driver = Arc::new(MockDriver::with_dom(dom));
        let config = SuiteConfig::new()
            .with_base_url("https://shop.test")
            .with_timeout_ms(200);
        (driver.clone(), BrowserSession::new(driver, config))
    }

    fn form_dom() -> MockDom {
        let mut dom = MockDom::default();
        dom.add(&["body"], ElementHandle::new("body"));
        dom.add(&["#susbscribe_email"], ElementHandle::new("input").with_value("old"));
        dom.add(&["#subscribe"], ElementHandle::new("button").with_text("Subscribe"));
        dom.add(&["#scrollUp"], ElementHandle::new("a").hidden());
        dom
    }

    mod action_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_fluent_chain() {
            let (driver, session) = session_with(form_dom());
            let email = Selector::css("#susbscribe_email");
            session
                .visit("/")
                .await
                .unwrap()
                .type_text(&email, "a@example.com")
                .await
                .unwrap()
                .click(&Selector::css("#subscribe"))
                .await
                .unwrap();
            assert_eq!(session.value(&email).await.unwrap(), "a@example.com");
            assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/");
            assert!(driver.was_called("click"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_hidden_fails_after_budget() {
            let (_, session) = session_with(form_dom());
            let err = session.click(&Selector::css("#scrollUp")).await.unwrap_err();
            assert!(matches!(err, CheckError::AssertionFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_verify_missing_is_element_not_found() {
            let (_, session) = session_with(form_dom());
            let err = session
                .verify_visible(&Selector::css("#cart_info_table"))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CheckError::ElementNotFound { timeout_ms: 200, .. }
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_url_expectations() {
            let (_, session) = session_with(form_dom());
            session.visit("/view_cart").await.unwrap();
            session.expect_url_contains("/view_cart").await.unwrap();
            session.expect_url_excludes("/login").await.unwrap();
            let err = session.expect_url_contains("/products").await.unwrap_err();
            assert!(matches!(err, CheckError::AssertionFailed { .. }));
        }
    }

    mod storage_tests {
        use super::*;

        #[tokio::test]
        async fn test_cookie_and_local_storage() {
            let (_, session) = session_with(form_dom());
            session
                .set_cookie("consent", "yes")
                .await
                .unwrap()
                .set_local_storage("cart", "[1]")
                .await
                .unwrap();
            assert_eq!(session.cookie("consent").await.unwrap().unwrap().value, "yes");
            assert_eq!(session.local_storage("cart").await.unwrap().as_deref(), Some("[1]"));
            session.clear_browser_data().await.unwrap();
            assert!(session.cookie("consent").await.unwrap().is_none());
            assert!(session.storage_state().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_backup_and_restore() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("temp").join("checkout_cookies.json");
            let (_, session) = session_with(form_dom());
            session.set_cookie("sid", "42").await.unwrap();
            session.set_local_storage("k", "v").await.unwrap();
            session.backup_state(&path).await.unwrap();
            session.clear_browser_data().await.unwrap();
            session.restore_state(&path).await.unwrap();
            let state = session.storage_state().await.unwrap();
            assert_eq!(state.cookies[0].value, "42");
            assert_eq!(state.local_storage.get("k").map(String::as_str), Some("v"));
        }

        #[tokio::test]
        async fn test_screenshot_written() {
            let dir = tempfile::tempdir().unwrap();
            let driver = Arc::new(MockDriver::new());
            let session = BrowserSession::new(
                driver,
                SuiteConfig::new().with_screenshots_dir(dir.path()),
            );
            let path = session.capture_screenshot("home").await.unwrap();
            assert!(path.ends_with("home.png"));
            assert!(std::fs::read(path).unwrap().starts_with(b"\x89PNG"));
        }
    }

    mod network_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_request_after_visit() {
            let (_, session) = session_with(form_dom());
            session
                .intercept(HttpMethod::Get, "**/view_cart", "cart")
                .await
                .unwrap()
                .visit("/view_cart")
                .await
                .unwrap()
                .wait_for_request("cart")
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_request_times_out() {
            let (_, session) = session_with(form_dom());
            session.intercept(HttpMethod::Post, "/searchProduct", "search").await.unwrap();
            let err = session.next_request("search").await.unwrap_err();
            assert!(matches!(err, CheckError::TimeoutExceeded { ms: 10_000, .. }));
        }

        #[tokio::test]
        async fn test_alert_stub() {
            let (driver, session) = session_with(form_dom());
            session.handle_alert(true).await.unwrap();
            assert!(driver.with_dom_mut(|d| d.dialogs_stubbed) == Some(true));
        }
    }
}
