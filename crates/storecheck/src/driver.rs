//! Browser driver abstraction.
//!
//! Every remote interaction goes through [`BrowserDriver`]. Two backends
//! exist:
//!
//! - [`MockDriver`]: in-memory DOM for unit tests and offline scenarios
//! - `ChromiumDriver` (feature `browser`): Chrome DevTools Protocol
//!
//! Drivers act on the first match of a selector and do not wait; waiting
//! is the session's job (see [`crate::wait`]).

use crate::config::Viewport;
use crate::locator::Selector;
use crate::network::{CapturedRequest, HttpMethod};
use crate::result::{CheckError, CheckResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

/// Element bounding box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box lies fully inside a viewport
    #[must_use]
    pub fn inside(&self, viewport: Viewport) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= f64::from(viewport.width)
            && self.y + self.height <= f64::from(viewport.height)
    }
}

/// Snapshot of one matched element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Lowercase tag name
    pub tag_name: String,
    /// Full text content
    pub text: String,
    /// Form value, for inputs
    pub value: Option<String>,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Rendered and not hidden
    pub visible: bool,
    /// Layout box, when known
    pub bounding_box: Option<BoundingBox>,
}

impl ElementHandle {
    /// Visible element with the given tag
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            visible: true,
            ..Self::default()
        }
    }

    /// Set text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the layout box
    #[must_use]
    pub const fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Mark hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Captured page image
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// PNG bytes
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Capture time
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a screenshot record
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: SystemTime::now(),
        }
    }
}

/// Browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain, empty for the current host
    #[serde(default)]
    pub domain: String,
    /// Path
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// HTTP only flag
    #[serde(default)]
    pub http_only: bool,
    /// Secure flag
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Cookie for the current host
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: default_cookie_path(),
            http_only: false,
            secure: false,
        }
    }

    /// Set domain
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

/// Window scroll target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollPosition {
    /// Top of the document
    Top,
    /// Bottom of the document
    Bottom,
}

/// Which storage area an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageArea {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

impl StorageArea {
    /// JavaScript global name
    #[must_use]
    pub const fn js_name(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

/// Browser control seam
#[async_trait]
pub trait BrowserDriver: Send + Sync + fmt::Debug {
    /// Navigate to an absolute URL
    async fn navigate(&self, url: &str) -> CheckResult<()>;

    /// Current page URL
    async fn current_url(&self) -> CheckResult<String>;

    /// Document title
    async fn title(&self) -> CheckResult<String>;

    /// `document.readyState`
    async fn ready_state(&self) -> CheckResult<String>;

    /// All elements matching a selector, in document order
    async fn query_all(&self, selector: &Selector) -> CheckResult<Vec<ElementHandle>>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> CheckResult<()>;

    /// Clear the first match's value
    async fn clear(&self, selector: &Selector) -> CheckResult<()>;

    /// Type into the first match
    async fn type_text(&self, selector: &Selector, text: &str) -> CheckResult<()>;

    /// Choose an option of the first matching `<select>`
    async fn select_option(&self, selector: &Selector, option: &str) -> CheckResult<()>;

    /// Check the first matching checkbox or radio
    async fn check(&self, selector: &Selector) -> CheckResult<()>;

    /// Move focus away from the first match, firing `change`
    async fn blur(&self, selector: &Selector) -> CheckResult<()>;

    /// Scroll the first match into view
    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()>;

    /// Scroll the window
    async fn scroll_to(&self, position: ScrollPosition) -> CheckResult<()>;

    /// Capture the viewport
    async fn screenshot(&self) -> CheckResult<Screenshot>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> CheckResult<()>;

    /// Cookies visible to the page
    async fn cookies(&self) -> CheckResult<Vec<Cookie>>;

    /// Add or replace a cookie
    async fn set_cookie(&self, cookie: Cookie) -> CheckResult<()>;

    /// Remove all cookies
    async fn clear_cookies(&self) -> CheckResult<()>;

    /// All entries of a storage area
    async fn storage_entries(&self, area: StorageArea) -> CheckResult<BTreeMap<String, String>>;

    /// Set a storage item
    async fn set_storage_item(&self, area: StorageArea, key: &str, value: &str)
        -> CheckResult<()>;

    /// Empty a storage area
    async fn clear_storage(&self, area: StorageArea) -> CheckResult<()>;

    /// Replace `alert`/`confirm` with stubs answering `accept`
    async fn stub_dialogs(&self, accept: bool) -> CheckResult<()>;

    /// Requests the page issued since it was opened
    async fn network_log(&self) -> CheckResult<Vec<CapturedRequest>>;

    /// Release the browser
    async fn close(&self) -> CheckResult<()>;
}

/// Identifier of a node in a [`MockDom`]
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct MockNode {
    selectors: Vec<String>,
    parent: Option<NodeId>,
    element: ElementHandle,
    removed: bool,
}

/// Something the mock driver just did, passed to hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Page changed to this URL
    Navigated {
        /// Absolute URL
        url: String,
    },
    /// Node was clicked
    Clicked {
        /// Target
        node: NodeId,
    },
    /// Text was typed into a node
    Typed {
        /// Target
        node: NodeId,
        /// Typed text
        text: String,
    },
    /// Node value was cleared
    Cleared {
        /// Target
        node: NodeId,
    },
    /// Node lost focus
    Blurred {
        /// Target
        node: NodeId,
    },
    /// Option chosen on a node
    Selected {
        /// Target
        node: NodeId,
        /// Option text
        option: String,
    },
}

/// In-memory page state behind [`MockDriver`]
///
/// Nodes are registered under one or more CSS strings and may have a
/// parent, which is enough to answer scoped, indexed and text queries.
#[derive(Debug, Clone)]
pub struct MockDom {
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    /// `document.readyState`
    pub ready_state: String,
    /// Current viewport
    pub viewport: Viewport,
    /// Vertical scroll offset marker
    pub scroll: Option<ScrollPosition>,
    /// Cookies
    pub cookies: Vec<Cookie>,
    /// `localStorage`
    pub local_storage: BTreeMap<String, String>,
    /// `sessionStorage`
    pub session_storage: BTreeMap<String, String>,
    /// Stubbed dialog answer, if stubbed
    pub dialogs_stubbed: Option<bool>,
    /// Requests the page issued
    pub network: Vec<CapturedRequest>,
    /// Driver calls, `name:argument`
    pub history: Vec<String>,
    nodes: Vec<MockNode>,
}

impl Default for MockDom {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            ready_state: "complete".to_string(),
            viewport: Viewport::DESKTOP,
            scroll: None,
            cookies: Vec::new(),
            local_storage: BTreeMap::new(),
            session_storage: BTreeMap::new(),
            dialogs_stubbed: None,
            network: Vec::new(),
            history: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl MockDom {
    /// Add a top-level node matched by each CSS string in `selectors`
    pub fn add(&mut self, selectors: &[&str], element: ElementHandle) -> NodeId {
        self.insert(None, selectors, element)
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: NodeId, selectors: &[&str], element: ElementHandle) -> NodeId {
        self.insert(Some(parent), selectors, element)
    }

    fn insert(&mut self, parent: Option<NodeId>, selectors: &[&str], element: ElementHandle) -> NodeId {
        self.nodes.push(MockNode {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            parent,
            element,
            removed: false,
        });
        self.nodes.len() - 1
    }

    /// Remove a node and its descendants
    pub fn remove(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = (0..self.nodes.len())
            .filter(|&n| n == id || self.is_descendant(n, id))
            .collect();
        for n in doomed {
            self.nodes[n].removed = true;
        }
    }

    /// Drop every node
    pub fn clear_nodes(&mut self) {
        self.nodes.clear();
    }

    /// Element stored for a live node
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementHandle> {
        self.nodes.get(id).filter(|n| !n.removed).map(|n| &n.element)
    }

    /// Mutable element for a live node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementHandle> {
        self.nodes
            .get_mut(id)
            .filter(|n| !n.removed)
            .map(|n| &mut n.element)
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Nearest ancestor (or self) registered under `css`
    #[must_use]
    pub fn closest(&self, id: NodeId, css: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            if self.nodes.get(n)?.selectors.iter().any(|s| s == css) {
                return Some(n);
            }
            cursor = self.parent(n);
        }
        None
    }

    /// Whether a live node is registered under `css`
    #[must_use]
    pub fn matches(&self, id: NodeId, css: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| !n.removed && n.selectors.iter().any(|s| s == css))
    }

    /// Show or hide a node
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(el) = self.element_mut(id) {
            el.visible = visible;
        }
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| !n.removed)
    }

    fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(n) = cursor {
            if n == ancestor {
                return true;
            }
            cursor = self.parent(n);
        }
        false
    }

    fn is_rendered(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            match self.nodes.get(n) {
                Some(node) if node.element.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Own text followed by descendants' text, like `textContent`
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = self
            .element(id)
            .map(|e| e.text.clone())
            .unwrap_or_default();
        for child in self.live_ids().filter(|&c| self.parent(c) == Some(id)) {
            out.push_str(&self.text_content(child));
        }
        out
    }

    fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&n| self.is_live(n))
    }

    /// Node ids matching a selector, in insertion order
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Vec<NodeId> {
        match selector {
            Selector::Css(css) => self.live_ids().filter(|&n| self.matches(n, css)).collect(),
            Selector::Text(text) => self
                .live_ids()
                .filter(|&n| self.text_content(n).contains(text.as_str()))
                .filter(|&n| {
                    !self.live_ids().any(|c| {
                        self.parent(c) == Some(n) && self.text_content(c).contains(text.as_str())
                    })
                })
                .collect(),
            Selector::HasText { base, text } => self
                .resolve(base)
                .into_iter()
                .filter(|&n| self.text_content(n).contains(text.as_str()))
                .collect(),
            Selector::Nth { base, index } => {
                self.resolve(base).get(*index).copied().into_iter().collect()
            }
            Selector::Within { parent, child } => {
                let scopes = self.resolve(parent);
                self.resolve(child)
                    .into_iter()
                    .filter(|&n| scopes.iter().any(|&p| self.is_descendant(n, p)))
                    .collect()
            }
            Selector::Visible(base) => self
                .resolve(base)
                .into_iter()
                .filter(|&n| self.is_rendered(n))
                .collect(),
        }
    }

    /// Element snapshot as a driver would report it
    #[must_use]
    pub fn snapshot(&self, id: NodeId) -> Option<ElementHandle> {
        let mut element = self.element(id)?.clone();
        element.text = self.text_content(id);
        element.visible = self.is_rendered(id);
        Some(element)
    }
}

/// Callback run after each mock driver event
pub type MockHook = Arc<dyn Fn(&mut MockDom, &DriverEvent) + Send + Sync>;

/// In-memory driver for tests
///
/// Default behavior: clicking an element with an `href` navigates,
/// typing appends to the value, navigation is logged as a `GET` request.
/// Hooks registered with [`MockDriver::on_event`] script everything else.
pub struct MockDriver {
    dom: Mutex<MockDom>,
    hooks: Mutex<Vec<MockHook>>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("url", &self.lock().url)
            .finish_non_exhaustive()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::with_dom(MockDom::default())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl MockDriver {
    /// Empty page at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver over a prepared DOM
    #[must_use]
    pub fn with_dom(dom: MockDom) -> Self {
        Self {
            dom: Mutex::new(dom),
            hooks: Mutex::new(Vec::new()),
        }
    }

    /// Register a hook
    pub fn on_event<F>(&self, hook: F)
    where
        F: Fn(&mut MockDom, &DriverEvent) + Send + Sync + 'static,
    {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Inspect or mutate the DOM directly
    pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut self.lock())
    }

    /// Recorded calls
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Whether a call with this name was recorded
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls with this name
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{method}:");
        self.lock()
            .history
            .iter()
            .filter(|c| c.starts_with(&prefix) || c.as_str() == method)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockDom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, dom: &mut MockDom, event: &DriverEvent) {
        let hooks: Vec<MockHook> = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            hook(dom, event);
        }
    }

    fn record(dom: &mut MockDom, call: &str, arg: impl fmt::Display) {
        dom.history.push(format!("{call}:{arg}"));
    }

    fn target(dom: &MockDom, selector: &Selector) -> CheckResult<NodeId> {
        dom.resolve(selector)
            .first()
            .copied()
            .ok_or_else(|| CheckError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
    }

    fn actionable(dom: &MockDom, selector: &Selector) -> CheckResult<NodeId> {
        let id = Self::target(dom, selector)?;
        if dom.is_rendered(id) {
            Ok(id)
        } else {
            Err(CheckError::assertion(format!(
                "cannot act on {selector}: element is not visible"
            )))
        }
    }

    fn go(&self, dom: &mut MockDom, url: String) {
        dom.url.clone_from(&url);
        dom.ready_state = "complete".to_string();
        dom.scroll = None;
        dom.network
            .push(CapturedRequest::new(HttpMethod::Get, url.clone()).with_status(200));
        self.fire(dom, &DriverEvent::Navigated { url });
    }
}

/// Resolve an `href` against the current URL
fn resolve_href(current: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let origin = current
        .find("://")
        .map(|scheme_end| {
            let rest = &current[scheme_end + 3..];
            let host_len = rest.find('/').unwrap_or(rest.len());
            &current[..scheme_end + 3 + host_len]
        })
        .unwrap_or("");
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "navigate", url);
        self.go(&mut dom, url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> CheckResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> CheckResult<String> {
        Ok(self.lock().title.clone())
    }

    async fn ready_state(&self) -> CheckResult<String> {
        Ok(self.lock().ready_state.clone())
    }

    async fn query_all(&self, selector: &Selector) -> CheckResult<Vec<ElementHandle>> {
        let dom = self.lock();
        Ok(dom
            .resolve(selector)
            .into_iter()
            .filter_map(|id| dom.snapshot(id))
            .collect())
    }

    async fn click(&self, selector: &Selector) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "click", selector);
        let id = Self::actionable(&dom, selector)?;
        let href = dom.element(id).and_then(|e| e.attr("href")).map(str::to_string);
        self.fire(&mut dom, &DriverEvent::Clicked { node: id });
        if let Some(href) = href {
            let url = resolve_href(&dom.url, &href);
            self.go(&mut dom, url);
        }
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "clear", selector);
        let id = Self::actionable(&dom, selector)?;
        if let Some(el) = dom.element_mut(id) {
            el.value = Some(String::new());
        }
        self.fire(&mut dom, &DriverEvent::Cleared { node: id });
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "type", format_args!("{selector}={text}"));
        let id = Self::actionable(&dom, selector)?;
        if let Some(el) = dom.element_mut(id) {
            el.value.get_or_insert_with(String::new).push_str(text);
        }
        self.fire(
            &mut dom,
            &DriverEvent::Typed {
                node: id,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, option: &str) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "select", format_args!("{selector}={option}"));
        let id = Self::actionable(&dom, selector)?;
        if let Some(el) = dom.element_mut(id) {
            el.value = Some(option.to_string());
        }
        self.fire(
            &mut dom,
            &DriverEvent::Selected {
                node: id,
                option: option.to_string(),
            },
        );
        Ok(())
    }

    async fn check(&self, selector: &Selector) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "check", selector);
        let id = Self::actionable(&dom, selector)?;
        if let Some(el) = dom.element_mut(id) {
            el.attributes.insert("checked".to_string(), "true".to_string());
        }
        self.fire(&mut dom, &DriverEvent::Clicked { node: id });
        Ok(())
    }

    async fn blur(&self, selector: &Selector) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "blur", selector);
        let id = Self::target(&dom, selector)?;
        self.fire(&mut dom, &DriverEvent::Blurred { node: id });
        Ok(())
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "scroll_into_view", selector);
        Self::target(&dom, selector).map(|_| ())
    }

    async fn scroll_to(&self, position: ScrollPosition) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "scroll_to", format_args!("{position:?}"));
        dom.scroll = Some(position);
        Ok(())
    }

    async fn screenshot(&self) -> CheckResult<Screenshot> {
        let mut dom = self.lock();
        let url = dom.url.clone();
        Self::record(&mut dom, "screenshot", url);
        Ok(Screenshot::new(
            PNG_SIGNATURE.to_vec(),
            dom.viewport.width,
            dom.viewport.height,
        ))
    }

    async fn set_viewport(&self, viewport: Viewport) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(
            &mut dom,
            "set_viewport",
            format_args!("{}x{}", viewport.width, viewport.height),
        );
        dom.viewport = viewport;
        Ok(())
    }

    async fn cookies(&self) -> CheckResult<Vec<Cookie>> {
        Ok(self.lock().cookies.clone())
    }

    async fn set_cookie(&self, cookie: Cookie) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "set_cookie", &cookie.name);
        dom.cookies.retain(|c| c.name != cookie.name);
        dom.cookies.push(cookie);
        Ok(())
    }

    async fn clear_cookies(&self) -> CheckResult<()> {
        let mut dom = self.lock();
        dom.history.push("clear_cookies".to_string());
        dom.cookies.clear();
        Ok(())
    }

    async fn storage_entries(&self, area: StorageArea) -> CheckResult<BTreeMap<String, String>> {
        let dom = self.lock();
        Ok(match area {
            StorageArea::Local => dom.local_storage.clone(),
            StorageArea::Session => dom.session_storage.clone(),
        })
    }

    async fn set_storage_item(
        &self,
        area: StorageArea,
        key: &str,
        value: &str,
    ) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "set_storage", format_args!("{}.{key}", area.js_name()));
        let store = match area {
            StorageArea::Local => &mut dom.local_storage,
            StorageArea::Session => &mut dom.session_storage,
        };
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_storage(&self, area: StorageArea) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "clear_storage", area.js_name());
        match area {
            StorageArea::Local => dom.local_storage.clear(),
            StorageArea::Session => dom.session_storage.clear(),
        }
        Ok(())
    }

    async fn stub_dialogs(&self, accept: bool) -> CheckResult<()> {
        let mut dom = self.lock();
        Self::record(&mut dom, "stub_dialogs", accept);
        dom.dialogs_stubbed = Some(accept);
        Ok(())
    }

    async fn network_log(&self) -> CheckResult<Vec<CapturedRequest>> {
        Ok(self.lock().network.clone())
    }

    async fn close(&self) -> CheckResult<()> {
        self.lock().history.push("close".to_string());
        Ok(())
    }
}
