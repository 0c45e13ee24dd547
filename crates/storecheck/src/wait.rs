//! Polling waits.
//!
//! Every remote check polls until its condition holds or the budget runs
//! out. The condition is always evaluated at least once, so a zero budget
//! means "check now".
//!
//! Element waits report [`CheckError::ElementNotFound`] when the selector
//! never matched and [`CheckError::AssertionFailed`] when it matched but
//! the expectation never held. Other waits report
//! [`CheckError::TimeoutExceeded`].

use crate::config::DEFAULT_COMMAND_TIMEOUT_MS;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Wait budget and polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `probe` until it yields a value
///
/// `probe` returning `Err` aborts the wait with that error.
pub async fn wait_until<T, F, Fut>(what: &str, options: &WaitOptions, mut probe: F) -> CheckResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckResult<Option<T>>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(CheckError::TimeoutExceeded {
                what: what.to_string(),
                ms: options.timeout_ms,
            });
        }
        sleep(options.poll_interval()).await;
    }
}

/// Poll a selector until `predicate` accepts the matched set
///
/// `expectation` completes the sentence "expected <selector> to ...".
pub async fn wait_for_elements<P>(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    options: &WaitOptions,
    expectation: &str,
    predicate: P,
) -> CheckResult<Vec<ElementHandle>>
where
    P: Fn(&[ElementHandle]) -> bool + Send,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        let found = driver.query_all(selector).await?;
        if predicate(&found) {
            return Ok(found);
        }
        if Instant::now() >= deadline {
            tracing::debug!(%selector, matched = found.len(), expectation, "wait budget exhausted");
            return Err(if found.is_empty() {
                CheckError::ElementNotFound {
                    selector: selector.to_string(),
                    timeout_ms: options.timeout_ms,
                }
            } else {
                CheckError::assertion(format!(
                    "expected {selector} to {expectation} within {}ms, last saw {}",
                    options.timeout_ms,
                    describe(&found)
                ))
            });
        }
        sleep(options.poll_interval()).await;
    }
}

fn describe(found: &[ElementHandle]) -> String {
    let texts: Vec<String> = found
        .iter()
        .take(3)
        .map(|e| format!("<{}> {:?}", e.tag_name, e.text.trim()))
        .collect();
    let more = found.len().saturating_sub(3);
    if more > 0 {
        format!("{} (+{more} more)", texts.join(", "))
    } else {
        texts.join(", ")
    }
}

/// At least one match exists
pub async fn wait_for_exists(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    options: &WaitOptions,
) -> CheckResult<Vec<ElementHandle>> {
    wait_for_elements(driver, selector, options, "exist", |f| !f.is_empty()).await
}

/// At least one match is visible
pub async fn wait_for_visible(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    options: &WaitOptions,
) -> CheckResult<Vec<ElementHandle>> {
    wait_for_elements(driver, selector, options, "be visible", |f| {
        f.iter().any(|e| e.visible)
    })
    .await
}

/// No match is visible; an absent element counts as hidden
pub async fn wait_for_hidden(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    options: &WaitOptions,
) -> CheckResult<()> {
    wait_for_elements(driver, selector, options, "not be visible", |f| {
        f.iter().all(|e| !e.visible)
    })
    .await
    .map(|_| ())
}

/// Some match's text contains `text`
pub async fn wait_for_text(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    text: &str,
    options: &WaitOptions,
) -> CheckResult<Vec<ElementHandle>> {
    let expectation = format!("contain {text:?}");
    wait_for_elements(driver, selector, options, &expectation, |f| {
        f.iter().any(|e| e.text.contains(text))
    })
    .await
}

/// The first match has `name` equal to `value`
pub async fn wait_for_attribute(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    name: &str,
    value: &str,
    options: &WaitOptions,
) -> CheckResult<Vec<ElementHandle>> {
    let expectation = format!("have attribute {name}={value:?}");
    wait_for_elements(driver, selector, options, &expectation, |f| {
        f.first().and_then(|e| e.attr(name)) == Some(value)
    })
    .await
}

/// The first match has form value `value`
pub async fn wait_for_value(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    value: &str,
    options: &WaitOptions,
) -> CheckResult<Vec<ElementHandle>> {
    let expectation = format!("have value {value:?}");
    wait_for_elements(driver, selector, options, &expectation, |f| {
        f.first().and_then(|e| e.value.as_deref()) == Some(value)
    })
    .await
}

/// The number of matches satisfies `accept`
pub async fn wait_for_count<P>(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    options: &WaitOptions,
    expectation: &str,
    accept: P,
) -> CheckResult<usize>
where
    P: Fn(usize) -> bool + Send,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        let count = driver.query_all(selector).await?.len();
        if accept(count) {
            return Ok(count);
        }
        if Instant::now() >= deadline {
            return Err(CheckError::assertion(format!(
                "expected {selector} to have {expectation} matches, found {count}"
            )));
        }
        sleep(options.poll_interval()).await;
    }
}

/// The current URL contains `fragment`
pub async fn wait_for_url(
    driver: &dyn BrowserDriver,
    fragment: &str,
    options: &WaitOptions,
) -> CheckResult<String> {
    let what = format!("URL containing {fragment:?}");
    wait_until(&what, options, || async move {
        let url = driver.current_url().await?;
        Ok::<_, CheckError>(url.contains(fragment).then_some(url))
    })
    .await
}

/// Sleep for a constant time
///
/// Prefer a condition wait; this exists for handlers with no observable
/// completion signal.
pub async fn fixed_delay(ms: u64) {
    tracing::debug!(ms, "fixed delay");
    sleep(Duration::from_millis(ms)).await;
}

/// How to let the page catch up after a mutation with no completion signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Sleep a constant time
    Fixed(Duration),
    /// Poll until the page has changed and then held still, for at most `max`
    Stable {
        /// Gap between reads
        poll: Duration,
        /// Upper bound on the whole settle, spent in full when nothing changes
        max: Duration,
    },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self::Stable {
            poll: Duration::from_millis(250),
            max: Duration::from_millis(2000),
        }
    }
}

impl SettlePolicy {
    /// Constant delay in milliseconds
    #[must_use]
    pub const fn fixed_ms(ms: u64) -> Self {
        Self::Fixed(Duration::from_millis(ms))
    }
}

/// Texts and values of every match, in order
async fn signature(driver: &dyn BrowserDriver, probes: &[Selector]) -> CheckResult<Vec<String>> {
    let mut out = Vec::new();
    for probe in probes {
        let found = driver.query_all(probe).await?;
        out.push(found.len().to_string());
        for el in found {
            out.push(format!("{}|{}", el.text.trim(), el.value.unwrap_or_default()));
        }
    }
    Ok(out)
}

/// Run a mutation and let the page settle after it
///
/// `Stable` reads `probes` before `action` runs. Afterwards it polls every
/// `poll` until a read differs from that baseline and the next read matches
/// it. A page that never changes holds the caller for the full `max`.
/// Reaching `max` is not an error: the caller's next verification decides
/// whether the page is in the right state.
pub async fn settle_after<T, Fut>(
    driver: &dyn BrowserDriver,
    probes: &[Selector],
    policy: SettlePolicy,
    action: Fut,
) -> CheckResult<T>
where
    Fut: Future<Output = CheckResult<T>>,
{
    match policy {
        SettlePolicy::Fixed(delay) => {
            let out = action.await?;
            tracing::debug!(ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "settle: fixed");
            sleep(delay).await;
            Ok(out)
        }
        SettlePolicy::Stable { poll, max } => {
            let baseline = signature(driver, probes).await?;
            let out = action.await?;
            let deadline = Instant::now() + max;
            let mut changed: Option<Vec<String>> = None;
            loop {
                sleep(poll).await;
                let current = signature(driver, probes).await?;
                if changed.as_ref() == Some(&current) {
                    tracing::debug!(reads = current.len(), "settle: stable");
                    break;
                }
                if changed.is_some() || current != baseline {
                    changed = Some(current);
                }
                if Instant::now() >= deadline {
                    tracing::debug!(changed = changed.is_some(), "settle: budget spent");
                    break;
                }
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{DriverEvent, MockDom, MockDriver};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn opts(ms: u64) -> WaitOptions {
        WaitOptions::new().with_timeout(ms).with_poll_interval(10)
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_element_is_not_found() {
        let driver = MockDriver::new();
        let err = wait_for_visible(&driver, &Selector::css("#cartModal"), &opts(200))
            .await
            .unwrap_err();
        match err {
            CheckError::ElementNotFound { selector, timeout_ms } => {
                assert_eq!(selector, "#cartModal");
                assert_eq!(timeout_ms, 200);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_present_but_wrong_text_is_assertion() {
        let mut dom = MockDom::default();
        dom.add(&[".brands_products"], ElementHandle::new("div").with_text("Category"));
        let driver = MockDriver::with_dom(dom);
        let err = wait_for_text(&driver, &Selector::css(".brands_products"), "Brands", &opts(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::AssertionFailed { .. }));
        assert!(err.to_string().contains("Brands"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_appearing_later_is_found() {
        let driver = MockDriver::new();
        let polls = Arc::new(AtomicUsize::new(0));
        // Any navigation makes the element appear
        driver.on_event(|dom, event| {
            if matches!(event, DriverEvent::Navigated { .. }) {
                dom.add(&["#cart_info_table"], ElementHandle::new("table"));
            }
        });
        let counter = polls.clone();
        let found = wait_until("table", &opts(1000), || {
            let driver = &driver;
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 3 {
                    driver.navigate("https://shop.test/view_cart").await?;
                }
                let n = driver.query_all(&Selector::css("#cart_info_table")).await?.len();
                Ok::<_, CheckError>((n > 0).then_some(n))
            }
        })
        .await
        .unwrap();
        assert_eq!(found, 1);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_accepts_absent() {
        let driver = MockDriver::new();
        wait_for_hidden(&driver, &Selector::css("#cartModal"), &opts(0))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_attribute_and_value() {
        let mut dom = MockDom::default();
        dom.add(
            &["#susbscribe_email"],
            ElementHandle::new("input")
                .with_attr("type", "email")
                .with_value("a@b.c"),
        );
        let driver = MockDriver::with_dom(dom);
        let sel = Selector::css("#susbscribe_email");
        wait_for_attribute(&driver, &sel, "type", "email", &opts(0)).await.unwrap();
        wait_for_value(&driver, &sel, "a@b.c", &opts(0)).await.unwrap();
        assert!(wait_for_attribute(&driver, &sel, "type", "text", &opts(0)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_timeout() {
        let driver = MockDriver::new();
        let started = Instant::now();
        let err = wait_for_url(&driver, "/products", &opts(500)).await.unwrap_err();
        assert!(matches!(err, CheckError::TimeoutExceeded { ms: 500, .. }));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_count() {
        let mut dom = MockDom::default();
        dom.add(&["tr"], ElementHandle::new("tr"));
        dom.add(&["tr"], ElementHandle::new("tr"));
        let driver = MockDriver::with_dom(dom);
        let n = wait_for_count(&driver, &Selector::css("tr"), &opts(0), "more than 0", |n| n > 0)
            .await
            .unwrap();
        assert_eq!(n, 2);
        let err = wait_for_count(&driver, &Selector::css("tr"), &opts(0), "0", |n| n == 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    fn no_action() -> std::future::Ready<CheckResult<()>> {
        std::future::ready(Ok(()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_stable_waits_for_change_to_stop() {
        let mut dom = MockDom::default();
        let total = dom.add(&[".cart_total_price"], ElementHandle::new("p").with_text("Rs. 500"));
        let driver = Arc::new(MockDriver::with_dom(dom));
        let writer = driver.clone();
        let task = tokio::spawn(async move {
            for price in ["Rs. 1000", "Rs. 1500"] {
                sleep(Duration::from_millis(100)).await;
                writer.with_dom_mut(|d| {
                    if let Some(el) = d.element_mut(total) {
                        el.text = price.to_string();
                    }
                });
            }
        });
        let started = Instant::now();
        let policy = SettlePolicy::Stable {
            poll: Duration::from_millis(150),
            max: Duration::from_secs(5),
        };
        settle_after(driver.as_ref(), &[Selector::css(".cart_total_price")], policy, no_action())
            .await
            .unwrap();
        task.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
        let found = driver.query_all(&Selector::css(".cart_total_price")).await.unwrap();
        assert_eq!(found[0].text, "Rs. 1500");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_late_removal() {
        let mut dom = MockDom::default();
        let row = dom.add(&["#cart_info_table tbody tr"], ElementHandle::new("tr"));
        let driver = Arc::new(MockDriver::with_dom(dom));
        let server = driver.clone();
        let rows = [Selector::css("#cart_info_table tbody tr")];
        let started = Instant::now();
        settle_after(driver.as_ref(), &rows, SettlePolicy::default(), async move {
            tokio::spawn(async move {
                sleep(Duration::from_millis(600)).await;
                server.with_dom_mut(|d| d.remove(row));
            });
            Ok(())
        })
        .await
        .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert_eq!(driver.query_all(&rows[0]).await.unwrap().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_without_change_spends_budget() {
        let mut dom = MockDom::default();
        dom.add(&["tr"], ElementHandle::new("tr"));
        let driver = MockDriver::with_dom(dom);
        let started = Instant::now();
        let value = settle_after(&driver, &[Selector::css("tr")], SettlePolicy::default(), async {
            Ok(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_fixed_sleeps() {
        let driver = MockDriver::new();
        let started = Instant::now();
        settle_after(&driver, &[], SettlePolicy::fixed_ms(1500), no_action())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_propagates_action_error() {
        let driver = MockDriver::new();
        let err = settle_after::<(), _>(&driver, &[], SettlePolicy::default(), async {
            Err(CheckError::assertion("click failed"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CheckError::AssertionFailed { .. }));
    }
}
