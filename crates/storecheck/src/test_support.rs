//! Scripted storefront over [`MockDriver`] for unit tests.
//!
//! Pages are re-rendered from a small shared state on every navigation
//! and cart mutation, so page objects and commands can be exercised end
//! to end without a browser.

use crate::config::SuiteConfig;
use crate::context::BrowserSession;
use crate::driver::{DriverEvent, ElementHandle, MockDom, MockDriver, NodeId};
use crate::locator::Selector;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

pub const BASE_URL: &str = "https://shop.test";

/// `(id, name, price)`
pub const CATALOG: [(u32, &str, u32); 4] = [
    (1, "Blue Top", 500),
    (2, "Men Tshirt", 400),
    (3, "Sleeveless Dress", 1000),
    (4, "Stylish Dress", 1500),
];

#[derive(Debug, Default)]
pub struct StoreState {
    /// `(product id, quantity)` in insertion order
    pub cart: Vec<(u32, u32)>,
    pub user: Option<String>,
    pub search: Option<String>,
    /// Cart total shown with this offset, to fake a wrong total
    pub total_skew: u32,
    /// Render a grand-total cell below the cart table
    pub grand_total: bool,
    /// Server delay before cart edits show up on the page
    pub latency: Option<Duration>,
    pending: Vec<CartEdit>,
}

/// Row edit the server has accepted but not yet rendered
#[derive(Debug, Clone, Copy)]
enum CartEdit {
    Remove(usize),
    SetQuantity(usize, u32),
}

impl StoreState {
    fn add(&mut self, id: u32, qty: u32) {
        if let Some(line) = self.cart.iter_mut().find(|(i, _)| *i == id) {
            line.1 += qty;
        } else {
            self.cart.push((id, qty));
        }
    }

    fn apply(&mut self, edit: CartEdit) {
        match edit {
            CartEdit::Remove(row) if row < self.cart.len() => {
                self.cart.remove(row);
            }
            CartEdit::SetQuantity(row, qty) => {
                if let Some(line) = self.cart.get_mut(row) {
                    line.1 = qty;
                }
            }
            CartEdit::Remove(_) => {}
        }
    }

    /// Apply now, or queue behind the server delay
    fn edit(&mut self, dom: &mut MockDom, edit: CartEdit) {
        if self.latency.is_some() {
            self.pending.push(edit);
        } else {
            self.apply(edit);
            render(dom, self);
        }
    }
}

pub struct Storefront {
    pub driver: Arc<MockDriver>,
    pub session: BrowserSession,
    pub state: Arc<Mutex<StoreState>>,
}

impl Storefront {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: SuiteConfig) -> Self {
        let driver = Arc::new(MockDriver::new());
        let state = Arc::new(Mutex::new(StoreState::default()));
        let hook_state = state.clone();
        let hook_driver = Arc::downgrade(&driver);
        driver.on_event(move |dom, event| {
            let mut state = hook_state.lock().unwrap_or_else(PoisonError::into_inner);
            on_event(dom, event, &mut state);
            if let Some(delay) = state.latency {
                let edits = std::mem::take(&mut state.pending);
                if !edits.is_empty() {
                    deliver_later(hook_driver.clone(), hook_state.clone(), delay, edits);
                }
            }
        });
        let session = BrowserSession::new(driver.clone(), config);
        Self {
            driver,
            session,
            state,
        }
    }

    pub fn with_cart(self, lines: &[(u32, u32)]) -> Self {
        self.state().cart = lines.to_vec();
        self
    }

    /// Cart edits reach the page `ms` after the click or blur
    pub fn with_latency(self, ms: u64) -> Self {
        self.state().latency = Some(Duration::from_millis(ms));
        self
    }

    pub fn with_grand_total(self) -> Self {
        self.state().grand_total = true;
        self
    }

    pub fn logged_in(self, name: &str) -> Self {
        self.state().user = Some(name.to_string());
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cart(&self) -> Vec<(u32, u32)> {
        self.state().cart.clone()
    }

    pub fn url(&self) -> String {
        self.driver.with_dom_mut(|d| d.url.clone())
    }
}

pub fn test_config() -> SuiteConfig {
    SuiteConfig::new()
        .with_base_url(BASE_URL)
        .with_timeout_ms(300)
}

fn deliver_later(
    driver: Weak<MockDriver>,
    state: Arc<Mutex<StoreState>>,
    delay: Duration,
    edits: Vec<CartEdit>,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(driver) = driver.upgrade() else {
            return;
        };
        driver.with_dom_mut(|dom| {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            for edit in edits {
                state.apply(edit);
            }
            render(dom, &state);
        });
    });
}

fn product(id: u32) -> Option<(u32, &'static str, u32)> {
    CATALOG.iter().copied().find(|(i, _, _)| *i == id)
}

fn path_of(url: &str) -> String {
    url.strip_prefix(BASE_URL).unwrap_or(url).to_string()
}

fn el(tag: &str, text: &str) -> ElementHandle {
    ElementHandle::new(tag).with_text(text)
}

fn link(text: &str, href: &str) -> ElementHandle {
    el("a", text).with_attr("href", href)
}

fn on_event(dom: &mut MockDom, event: &DriverEvent, state: &mut StoreState) {
    match event {
        DriverEvent::Navigated { url } => {
            if path_of(url) == "/logout" {
                state.user = None;
                dom.url = format!("{BASE_URL}/login");
            }
            render(dom, state);
        }
        DriverEvent::Clicked { node } => on_click(dom, *node, state),
        DriverEvent::Blurred { node } => {
            if dom.matches(*node, ".cart_quantity_input") {
                let qty = dom
                    .element(*node)
                    .and_then(|e| e.value.as_deref())
                    .and_then(|v| v.trim().parse::<u32>().ok());
                if let (Some(row), Some(qty)) = (row_index(dom, *node), qty) {
                    state.edit(dom, CartEdit::SetQuantity(row, qty));
                }
            }
        }
        _ => {}
    }
}

fn product_id(dom: &MockDom, node: NodeId) -> Option<u32> {
    dom.element(node)
        .and_then(|e| e.attr("data-product-id"))
        .and_then(|v| v.parse().ok())
}

fn row_index(dom: &MockDom, node: NodeId) -> Option<usize> {
    let row = dom.closest(node, "#cart_info_table tbody tr")?;
    dom.resolve(&Selector::css("#cart_info_table tbody tr"))
        .iter()
        .position(|&r| r == row)
}

fn set_modal(dom: &mut MockDom, open: bool) {
    for id in dom.resolve(&Selector::css("#cartModal")) {
        dom.set_visible(id, open);
    }
}

fn on_click(dom: &mut MockDom, node: NodeId, state: &mut StoreState) {
    if dom.matches(node, ".productinfo .btn") || dom.matches(node, ".item .productinfo .btn") {
        if let Some(id) = product_id(dom, node) {
            state.add(id, 1);
            set_modal(dom, true);
        }
    } else if dom.matches(node, ".btn.btn-default.cart") {
        let qty = dom
            .resolve(&Selector::css("#quantity"))
            .first()
            .and_then(|&q| dom.element(q))
            .and_then(|e| e.value.as_deref())
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1);
        if let Some(id) = product_id(dom, node) {
            state.add(id, qty);
            set_modal(dom, true);
        }
    } else if dom.matches(node, ".modal-footer .btn-success") || dom.matches(node, ".modal .close") {
        set_modal(dom, false);
    } else if dom.matches(node, ".cart_quantity_delete") {
        if let Some(row) = row_index(dom, node) {
            state.edit(dom, CartEdit::Remove(row));
        }
    } else if dom.matches(node, "#submit_search") {
        let term = dom
            .resolve(&Selector::css("#search_product"))
            .first()
            .and_then(|&q| dom.element(q))
            .and_then(|e| e.value.clone())
            .unwrap_or_default();
        state.search = Some(term.clone());
        dom.url = format!("{BASE_URL}/products?search={term}");
        render(dom, state);
    }
}

fn render(dom: &mut MockDom, state: &StoreState) {
    dom.clear_nodes();
    dom.title = "Automation Exercise".to_string();
    let path = path_of(&dom.url);
    let body = dom.add(&["body"], el("body", ""));
    layout(dom, body, state);
    if path == "/" {
        home(dom, body);
    } else if path.starts_with("/products")
        || path.starts_with("/category_products")
        || path.starts_with("/brand_products")
    {
        let heading = if path.starts_with("/products?search=") {
            "Searched Products".to_string()
        } else if let Some(brand) = path.strip_prefix("/brand_products/") {
            format!("Brand - {brand} Products")
        } else if path.starts_with("/category_products") {
            "Women - Dress Products".to_string()
        } else {
            "All Products".to_string()
        };
        products(dom, body, &heading, state.search.as_deref());
    } else if let Some(id) = path.strip_prefix("/product_details/") {
        if let Some(p) = id.parse().ok().and_then(product) {
            details(dom, body, p);
        }
    } else if path == "/view_cart" {
        cart(dom, body, state);
    } else if path == "/contact_us" {
        dom.add_child(body, &["h2.title"], el("h2", "Get In Touch"));
    }
    modal(dom, body);
}

fn layout(dom: &mut MockDom, body: NodeId, state: &StoreState) {
    dom.add_child(body, &[".logo img"], ElementHandle::new("img"));
    let nav = dom.add_child(body, &[".navbar-nav"], ElementHandle::new("ul"));
    for (href, text) in [
        ("/", "Home"),
        ("/products", "Products"),
        ("/view_cart", "Cart"),
        ("/contact_us", "Contact us"),
        ("/test_cases", "Test Cases"),
    ] {
        let css = format!("a[href=\"{href}\"]");
        dom.add_child(nav, &[css.as_str()], link(text, href));
    }
    if let Some(user) = &state.user {
        dom.add_child(nav, &["a[href=\"/logout\"]"], link("Logout", "/logout"));
        dom.add_child(
            nav,
            &["a[href=\"/delete_account\"]"],
            link("Delete Account", "/delete_account"),
        );
        dom.add_child(nav, &["a"], el("a", &format!("Logged in as {user}")));
    }
    let footer = dom.add_child(body, &["#footer"], ElementHandle::new("footer"));
    dom.add_child(footer, &["#susbscribe_email"], ElementHandle::new("input").with_value(""));
    dom.add_child(footer, &["#subscribe"], el("button", ""));
    dom.add_child(footer, &["#footer a"], link("Privacy Policy", "/privacy"));
    dom.add_child(body, &["#scrollUp"], el("a", "^"));
}

fn cards(dom: &mut MockDom, parent: NodeId, only: Option<&str>) {
    for (id, name, price) in CATALOG {
        if only.is_some_and(|term| !name.to_lowercase().contains(&term.to_lowercase())) {
            continue;
        }
        let card = dom.add_child(parent, &[".features_items .col-sm-4"], ElementHandle::new("div"));
        let info = dom.add_child(card, &[".productinfo"], ElementHandle::new("div"));
        dom.add_child(info, &[".productinfo h2"], el("h2", &format!("Rs. {price}")));
        dom.add_child(info, &[".productinfo p"], el("p", name));
        dom.add_child(
            info,
            &[".productinfo .btn"],
            el("a", "Add to cart").with_attr("data-product-id", id.to_string()),
        );
        let href = format!("/product_details/{id}");
        dom.add_child(card, &[".choose .nav-pills li a"], link("View Product", &href));
    }
}

fn sidebar(dom: &mut MockDom, body: NodeId) {
    let panel = dom.add_child(
        body,
        &[".left-sidebar .category-products", ".panel-group"],
        ElementHandle::new("div"),
    );
    for (category, subs) in [("Women", ["Dress", "Tops"]), ("Kids", ["Dress", "Tops & Shirts"])] {
        dom.add_child(panel, &["a"], el("a", category));
        let sub = dom.add_child(panel, &[".panel-body"], ElementHandle::new("div"));
        for s in subs {
            dom.add_child(sub, &[".panel-body ul li a"], link(s, "/category_products/1"));
        }
    }
    let brands = dom.add_child(body, &[".brands_products"], ElementHandle::new("div"));
    dom.add_child(brands, &["h2"], el("h2", "Brands"));
    for brand in ["Polo", "H&M"] {
        let href = format!("/brand_products/{brand}");
        dom.add_child(brands, &[".brands_products ul li a"], link(brand, &href));
    }
}

fn home(dom: &mut MockDom, body: NodeId) {
    let hero = dom.add_child(body, &[".carousel"], ElementHandle::new("div"));
    dom.add_child(hero, &[".carousel-inner .item"], el("div", "Full-Fledged practice website"));
    dom.add_child(hero, &[".carousel-control-next"], el("a", ">"));
    dom.add_child(hero, &[".carousel-control-prev"], el("a", "<"));
    sidebar(dom, body);
    let features = dom.add_child(body, &[".features_items"], ElementHandle::new("div"));
    dom.add_child(features, &["h2.title"], el("h2", "Features Items"));
    cards(dom, features, None);
    recommended(dom, body);
}

fn recommended(dom: &mut MockDom, body: NodeId) {
    let carousel = dom.add_child(body, &["#recommended-item-carousel"], ElementHandle::new("div"));
    for (id, name, _) in CATALOG.iter().take(2) {
        let item = dom.add_child(carousel, &[".item"], ElementHandle::new("div"));
        dom.add_child(item, &["p"], el("p", name));
        dom.add_child(
            item,
            &[".item .productinfo .btn"],
            el("a", "Add to cart").with_attr("data-product-id", id.to_string()),
        );
    }
}

fn products(dom: &mut MockDom, body: NodeId, heading: &str, search: Option<&str>) {
    dom.add_child(body, &["#search_product"], ElementHandle::new("input").with_value(""));
    dom.add_child(body, &["#submit_search"], el("button", ""));
    sidebar(dom, body);
    let features = dom.add_child(body, &[".features_items"], ElementHandle::new("div"));
    dom.add_child(features, &["h2", "h2.title"], el("h2", heading));
    let filter = if heading == "Searched Products" { search } else { None };
    cards(dom, features, filter);
    let pages = dom.add_child(body, &[".pagination"], ElementHandle::new("ul"));
    for n in ["1", "2"] {
        dom.add_child(pages, &["a"], el("a", n));
    }
}

fn details(dom: &mut MockDom, body: NodeId, (id, name, price): (u32, &str, u32)) {
    let info = dom.add_child(body, &[".product-information"], ElementHandle::new("div"));
    dom.add_child(info, &["h2"], el("h2", name));
    dom.add_child(info, &["span"], el("span", &format!("Rs. {price}")));
    dom.add_child(info, &["#quantity"], ElementHandle::new("input").with_value("1"));
    dom.add_child(
        info,
        &[".btn.btn-default.cart"],
        el("button", "Add to cart").with_attr("data-product-id", id.to_string()),
    );
}

fn cart(dom: &mut MockDom, body: NodeId, state: &StoreState) {
    let crumbs = dom.add_child(body, &[".breadcrumb"], ElementHandle::new("ol"));
    dom.add_child(crumbs, &["a"], link("Home", "/"));
    dom.add_child(crumbs, &[".breadcrumb li.active"], el("li", "Shopping Cart"));

    let table = dom.add_child(body, &["#cart_info_table", ".cart_info"], ElementHandle::new("table"));
    let head = dom.add_child(table, &[".cart_info thead"], ElementHandle::new("thead"));
    for h in ["Item", "Description", "Price", "Quantity", "Total"] {
        dom.add_child(head, &["th"], el("td", h));
    }
    let tbody = dom.add_child(table, &[".cart_info tbody"], ElementHandle::new("tbody"));
    for (index, (id, qty)) in state.cart.iter().enumerate() {
        let Some((_, name, price)) = product(*id) else {
            continue;
        };
        let skew = if index == 0 { state.total_skew } else { 0 };
        let row = dom.add_child(tbody, &["#cart_info_table tbody tr"], ElementHandle::new("tr"));
        dom.add_child(row, &[".cart_product img"], ElementHandle::new("img"));
        let desc = dom.add_child(row, &[".cart_description"], ElementHandle::new("td"));
        dom.add_child(desc, &[".cart_description h4 a"], el("a", name));
        dom.add_child(row, &[".cart_price p"], el("p", &format!("Rs. {price}")));
        dom.add_child(
            row,
            &[".cart_quantity_input"],
            ElementHandle::new("input").with_value(qty.to_string()),
        );
        dom.add_child(
            row,
            &[".cart_total_price"],
            el("p", &format!("Rs. {}", price * qty + skew)),
        );
        dom.add_child(row, &[".cart_quantity_delete"], el("a", "x"));
    }
    if state.grand_total {
        let sum: u32 = state
            .cart
            .iter()
            .filter_map(|(id, qty)| product(*id).map(|(_, _, price)| price * qty))
            .sum();
        let summary = dom.add_child(body, &["#cart_summary"], ElementHandle::new("table"));
        dom.add_child(summary, &["td"], el("td", "Total Amount"));
        dom.add_child(summary, &[".cart_total_price"], el("p", &format!("Rs. {sum}")));
    }
    let empty = dom.add_child(body, &["#empty_cart"], el("span", "Cart is empty!"));
    dom.set_visible(empty, state.cart.is_empty());
    dom.add_child(
        body,
        &[".btn.btn-default.check_out"],
        link("Proceed To Checkout", "/checkout"),
    );
    recommended(dom, body);
}

fn modal(dom: &mut MockDom, body: NodeId) {
    let modal = dom.add_child(body, &["#cartModal", ".modal"], ElementHandle::new("div").hidden());
    dom.add_child(modal, &["p"], el("p", "Your product has been added to cart."));
    dom.add_child(
        modal,
        &[
            ".modal-footer .btn-success",
            ".modal-footer .btn.btn-success",
            ".modal-footer .btn-primary, .modal-footer .btn-success",
        ],
        el("button", "Continue Shopping"),
    );
    dom.add_child(
        modal,
        &[".modal-footer .btn-info", "a[href=\"/view_cart\"]"],
        link("View Cart", "/view_cart"),
    );
    dom.add_child(modal, &[".modal .close, .modal-header .close", ".modal .close"], el("button", "x"));
}
