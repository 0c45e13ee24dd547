//! Chrome DevTools Protocol backend.
//!
//! Selectors are compiled to JavaScript with [`Selector::to_query`] and
//! evaluated in the page, so chained selectors behave the same as in
//! [`crate::driver::MockDriver`]. Page requests are recorded by a small
//! `fetch`/`XMLHttpRequest` shim installed on every new document.

use crate::config::Viewport;
use crate::driver::{BrowserDriver, Cookie, ElementHandle, Screenshot, ScrollPosition, StorageArea};
use crate::locator::Selector;
use crate::network::{CapturedRequest, HttpMethod};
use crate::result::{CheckError, CheckResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{ClearBrowserCookiesParams, CookieParam};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

const NETWORK_SHIM: &str = r"(() => {
  if (window.__storecheckLog) return;
  window.__storecheckLog = [];
  const log = window.__storecheckLog;
  const origFetch = window.fetch;
  window.fetch = function(input, init) {
    const entry = {
      method: ((init && init.method) || (input && input.method) || 'GET').toUpperCase(),
      url: new URL(typeof input === 'string' ? input : input.url, location.href).href,
      status: null,
      body: init && typeof init.body === 'string' ? init.body : null,
    };
    log.push(entry);
    return origFetch.apply(this, arguments).then(r => { entry.status = r.status; return r; });
  };
  const open = XMLHttpRequest.prototype.open;
  const send = XMLHttpRequest.prototype.send;
  XMLHttpRequest.prototype.open = function(method, url) {
    this.__entry = { method: String(method).toUpperCase(), url: new URL(url, location.href).href, status: null, body: null };
    return open.apply(this, arguments);
  };
  XMLHttpRequest.prototype.send = function(body) {
    const entry = this.__entry;
    if (entry) {
      entry.body = typeof body === 'string' ? body : null;
      log.push(entry);
      this.addEventListener('loadend', () => { entry.status = this.status; });
    }
    return send.apply(this, arguments);
  };
})()";

/// Launch options for [`ChromiumDriver`]
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Run without a window
    pub headless: bool,
    /// Chrome sandbox (disable in containers)
    pub sandbox: bool,
    /// Chromium binary, auto-detected when `None`
    pub chromium_path: Option<String>,
    /// Initial window size
    pub viewport: Viewport,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            viewport: Viewport::DESKTOP,
        }
    }
}

impl ChromiumOptions {
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

#[derive(Deserialize)]
struct RawRequest {
    method: String,
    url: String,
    status: Option<u16>,
    body: Option<String>,
}

/// Real browser over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

fn cdp_err(e: impl std::fmt::Display) -> CheckError {
    CheckError::driver(e.to_string())
}

impl ChromiumDriver {
    /// Launch chromium and open a blank page
    pub async fn launch(options: ChromiumOptions) -> CheckResult<Self> {
        let mut builder = CdpConfig::builder().window_size(options.viewport.width, options.viewport.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(cdp_err)?;

        let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(cdp_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(NETWORK_SHIM))
            .await
            .map_err(cdp_err)?;
        info!(headless = options.headless, "chromium launched");

        let driver = Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        };
        driver.set_viewport(options.viewport).await?;
        Ok(driver)
    }

    async fn eval<T: DeserializeOwned>(&self, expr: String) -> CheckResult<T> {
        let result = self.page.evaluate(expr).await.map_err(cdp_err)?;
        result.into_value().map_err(cdp_err)
    }

    /// Run `body` with `el` bound to the first match; missing elements are
    /// [`CheckError::ElementNotFound`]
    async fn with_first(&self, selector: &Selector, body: &str) -> CheckResult<()> {
        let expr = format!(
            "(() => {{ const el = ({})[0]; if (!el) return false; {body}; return true; }})()",
            selector.to_query()
        );
        debug!(%selector, "cdp action");
        if self.eval::<bool>(expr).await? {
            Ok(())
        } else {
            Err(CheckError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> CheckResult<()> {
        self.page.goto(url).await.map_err(|e| CheckError::driver(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn current_url(&self) -> CheckResult<String> {
        Ok(self.page.url().await.map_err(cdp_err)?.unwrap_or_default())
    }

    async fn title(&self) -> CheckResult<String> {
        Ok(self.page.get_title().await.map_err(cdp_err)?.unwrap_or_default())
    }

    async fn ready_state(&self) -> CheckResult<String> {
        self.eval("document.readyState".to_string()).await
    }

    async fn query_all(&self, selector: &Selector) -> CheckResult<Vec<ElementHandle>> {
        let expr = format!(
            "({}).map(el => {{ const r = el.getBoundingClientRect(); return {{ \
             tag_name: el.tagName.toLowerCase(), \
             text: el.textContent || '', \
             value: 'value' in el ? String(el.value) : null, \
             attributes: Object.fromEntries(Array.from(el.attributes).map(a => [a.name, a.value])), \
             visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length), \
             bounding_box: {{ x: r.x, y: r.y, width: r.width, height: r.height }} }}; }})",
            selector.to_query()
        );
        self.eval(expr).await
    }

    async fn click(&self, selector: &Selector) -> CheckResult<()> {
        self.with_first(selector, "el.scrollIntoView({block: 'center'}); el.click()")
            .await
    }

    async fn clear(&self, selector: &Selector) -> CheckResult<()> {
        self.with_first(
            selector,
            "el.value = ''; el.dispatchEvent(new Event('input', {bubbles: true}))",
        )
        .await
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> CheckResult<()> {
        let text = serde_json::to_string(text)?;
        let body = format!(
            "el.focus(); for (const ch of {text}) {{ el.value += ch; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); }}"
        );
        self.with_first(selector, &body).await
    }

    async fn select_option(&self, selector: &Selector, option: &str) -> CheckResult<()> {
        let option = serde_json::to_string(option)?;
        let body = format!(
            "const opt = Array.from(el.options || []).find(o => o.value === {option} || o.text.trim() === {option}); \
             if (!opt) return false; el.value = opt.value; \
             el.dispatchEvent(new Event('change', {{bubbles: true}}))"
        );
        self.with_first(selector, &body).await
    }

    async fn check(&self, selector: &Selector) -> CheckResult<()> {
        self.with_first(selector, "if (!el.checked) el.click()").await
    }

    async fn blur(&self, selector: &Selector) -> CheckResult<()> {
        self.with_first(
            selector,
            "el.dispatchEvent(new Event('change', {bubbles: true})); el.blur()",
        )
        .await
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()> {
        self.with_first(selector, "el.scrollIntoView({block: 'center'})").await
    }

    async fn scroll_to(&self, position: ScrollPosition) -> CheckResult<()> {
        let expr = match position {
            ScrollPosition::Top => "window.scrollTo(0, 0); true",
            ScrollPosition::Bottom => "window.scrollTo(0, document.body.scrollHeight); true",
        };
        self.eval::<bool>(expr.to_string()).await.map(|_| ())
    }

    async fn screenshot(&self) -> CheckResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(cdp_err)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(cdp_err)?;
        let (width, height): (u32, u32) = self
            .eval("[window.innerWidth, window.innerHeight]".to_string())
            .await?;
        Ok(Screenshot::new(data, width, height))
    }

    async fn set_viewport(&self, viewport: Viewport) -> CheckResult<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            viewport.width < 768,
        );
        self.page.execute(params).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn cookies(&self) -> CheckResult<Vec<Cookie>> {
        let cookies = self.page.get_cookies().await.map_err(cdp_err)?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn set_cookie(&self, cookie: Cookie) -> CheckResult<()> {
        let mut param = CookieParam::new(cookie.name, cookie.value);
        param.path = Some(cookie.path);
        param.http_only = Some(cookie.http_only);
        param.secure = Some(cookie.secure);
        if cookie.domain.is_empty() {
            param.url = Some(self.current_url().await?);
        } else {
            param.domain = Some(cookie.domain);
        }
        self.page.set_cookie(param).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn clear_cookies(&self) -> CheckResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(cdp_err)?;
        Ok(())
    }

    async fn storage_entries(&self, area: StorageArea) -> CheckResult<BTreeMap<String, String>> {
        self.eval(format!("Object.assign({{}}, window.{})", area.js_name()))
            .await
    }

    async fn set_storage_item(
        &self,
        area: StorageArea,
        key: &str,
        value: &str,
    ) -> CheckResult<()> {
        let key = serde_json::to_string(key)?;
        let value = serde_json::to_string(value)?;
        self.eval::<bool>(format!("window.{}.setItem({key}, {value}); true", area.js_name()))
            .await
            .map(|_| ())
    }

    async fn clear_storage(&self, area: StorageArea) -> CheckResult<()> {
        self.eval::<bool>(format!("window.{}.clear(); true", area.js_name()))
            .await
            .map(|_| ())
    }

    async fn stub_dialogs(&self, accept: bool) -> CheckResult<()> {
        self.eval::<bool>(format!(
            "window.alert = () => {{}}; window.confirm = () => {accept}; \
             window.prompt = () => {}; true",
            if accept { "''" } else { "null" }
        ))
        .await
        .map(|_| ())
    }

    async fn network_log(&self) -> CheckResult<Vec<CapturedRequest>> {
        let raw: Vec<RawRequest> = self
            .eval("window.__storecheckLog || []".to_string())
            .await?;
        Ok(raw
            .into_iter()
            .map(|r| CapturedRequest {
                method: r.method.parse().unwrap_or(HttpMethod::Get),
                url: r.url,
                status: r.status,
                body: r.body,
            })
            .collect())
    }

    async fn close(&self) -> CheckResult<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser.close().await.map_err(cdp_err)?;
            browser.wait().await.map_err(cdp_err)?;
        }
        self.handler.abort();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ChromiumOptions::default().with_no_sandbox();
        assert!(options.headless);
        assert!(!options.sandbox);
        assert_eq!(options.viewport, Viewport::DESKTOP);
    }

    #[tokio::test]
    #[ignore = "requires a local chromium"]
    async fn test_launch_and_query() {
        let driver = ChromiumDriver::launch(ChromiumOptions::default().with_no_sandbox())
            .await
            .unwrap();
        driver
            .navigate("data:text/html,<h2 class='title'>Get In Touch</h2>")
            .await
            .unwrap();
        let found = driver.query_all(&Selector::css("h2.title")).await.unwrap();
        assert_eq!(found[0].text, "Get In Touch");
        driver.close().await.unwrap();
    }
}
