//! Shopping cart page.
//!
//! Rows are addressed by index (`cartRows` nth) and every per-row read is
//! scoped to its row. Mutations end with a settle step because the cart
//! re-renders totals asynchronously.

use crate::config::Viewport;
use crate::context::BrowserSession;
use crate::helpers::parse_currency;
use crate::locator::{Selector, SelectorMap};
use crate::page_object::{expect, PageObject};
use crate::result::{CheckError, CheckResult};
use crate::wait::{self, SettlePolicy};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const SELECTORS: &[(&str, &str)] = &[
    ("pageTitle", ".breadcrumb li.active"),
    ("cartTable", "#cart_info_table"),
    ("cartTableHeader", ".cart_info thead"),
    ("cartTableBody", ".cart_info tbody"),
    ("cartRows", "#cart_info_table tbody tr"),
    ("productImage", ".cart_product img"),
    ("productDescription", ".cart_description h4 a"),
    ("productPrice", ".cart_price p"),
    ("productQuantity", ".cart_quantity_input"),
    ("productTotal", ".cart_total_price"),
    ("deleteButton", ".cart_quantity_delete"),
    ("totalAmount", ".cart_total_price"),
    ("proceedCheckoutBtn", ".btn.btn-default.check_out"),
    ("emptyCartMessage", "#empty_cart"),
    ("recommendedItems", "#recommended-item-carousel"),
    ("recommendedAddBtn", ".item .productinfo .btn"),
    ("breadcrumb", ".breadcrumb"),
];

/// Column headers of the cart table
pub const TABLE_HEADERS: [&str; 5] = ["Item", "Description", "Price", "Quantity", "Total"];

/// Largest accepted gap between the recomputed and the displayed total
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// Longest acceptable cart page load
pub const MAX_PAGE_LOAD: Duration = Duration::from_millis(3000);

/// One cart row as displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product name
    pub name: String,
    /// Unit price text, e.g. `Rs. 500`
    pub price: String,
    /// Quantity
    pub quantity: u32,
    /// Row total text
    pub total: String,
}

/// Optional per-row expectations for [`CartPage::verify_product_in_cart`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedLine {
    /// Price text the row must contain
    pub price: Option<String>,
    /// Exact quantity
    pub quantity: Option<u32>,
    /// Total text the row must contain
    pub total: Option<String>,
}

impl ExpectedLine {
    /// No expectations beyond presence
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect a price
    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Expect a quantity
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Expect a row total
    #[must_use]
    pub fn with_total(mut self, total: impl Into<String>) -> Self {
        self.total = Some(total.into());
        self
    }
}

/// The `/view_cart` page
#[derive(Debug, Clone)]
pub struct CartPage {
    session: BrowserSession,
    selectors: SelectorMap,
    settle: SettlePolicy,
}

impl PageObject for CartPage {
    fn url(&self) -> &str {
        "/view_cart"
    }

    fn selectors(&self) -> &SelectorMap {
        &self.selectors
    }

    fn session(&self) -> &BrowserSession {
        &self.session
    }
}

impl CartPage {
    /// Bind the page to a session
    pub fn new(session: BrowserSession) -> CheckResult<Self> {
        Ok(Self {
            session,
            selectors: SelectorMap::from_pairs(SELECTORS.iter().copied())?,
            settle: SettlePolicy::default(),
        })
    }

    /// Use a different settle step after mutations
    #[must_use]
    pub const fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    fn row(&self, index: usize) -> Selector {
        self.sel("cartRows").nth(index)
    }

    fn in_row(&self, index: usize, key: &str) -> Selector {
        self.row(index).find(self.sel(key))
    }

    async fn settled<T>(&self, action: impl Future<Output = CheckResult<T>>) -> CheckResult<T> {
        let probes = [self.sel("cartRows"), self.sel("productTotal")];
        wait::settle_after(self.session.driver(), &probes, self.settle, action).await
    }

    pub async fn visit_cart_page(&self) -> CheckResult<&Self> {
        self.visit().await?;
        self.verify_cart_page().await
    }

    /// Table visible and URL on the cart
    pub async fn verify_cart_page(&self) -> CheckResult<&Self> {
        self.verify_visible("cartTable").await?;
        self.session.expect_url_contains("/view_cart").await?;
        Ok(self)
    }

    /// Rows currently in the table
    pub async fn cart_items_count(&self) -> CheckResult<usize> {
        self.session.count(&self.sel("cartRows")).await
    }

    /// Empty-cart marker visible, or no rows when the page has no marker
    pub async fn verify_cart_is_empty(&self) -> CheckResult<&Self> {
        if self.session.exists_now(&self.sel("emptyCartMessage")).await? {
            self.verify_visible("emptyCartMessage").await
        } else {
            self.session
                .verify_count(&self.sel("cartRows"), "exactly 0", |n| n == 0)
                .await?;
            Ok(self)
        }
    }

    pub async fn verify_cart_is_not_empty(&self) -> CheckResult<&Self> {
        self.session
            .verify_count(&self.sel("cartRows"), "more than 0", |n| n > 0)
            .await?;
        Ok(self)
    }

    /// Index of the first row whose product name is exactly `name`
    async fn find_row(&self, name: &str) -> CheckResult<Option<usize>> {
        let rows = self.cart_items_count().await?;
        for index in 0..rows {
            if self.session.text(&self.in_row(index, "productDescription")).await? == name {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// A row named `name` exists and matches every given expectation
    pub async fn verify_product_in_cart(&self, name: &str, expected: &ExpectedLine) -> CheckResult<&Self> {
        let index = self
            .find_row(name)
            .await?
            .ok_or_else(|| CheckError::assertion(format!("no cart row for product {name:?}")))?;
        debug!(name, index, "verify cart row");
        if let Some(price) = &expected.price {
            self.verify_contains_text(self.in_row(index, "productPrice"), price)
                .await?;
        }
        if let Some(quantity) = expected.quantity {
            self.session
                .verify_value(&self.in_row(index, "productQuantity"), &quantity.to_string())
                .await?;
        }
        if let Some(total) = &expected.total {
            self.verify_contains_text(self.in_row(index, "productTotal"), total)
                .await?;
        }
        Ok(self)
    }

    /// Displayed fields of the `index`-th row
    pub async fn product_details(&self, index: usize) -> CheckResult<CartLine> {
        let raw_quantity = self.session.value(&self.in_row(index, "productQuantity")).await?;
        let quantity = raw_quantity.trim().parse().map_err(|_| {
            CheckError::assertion(format!("row {index} quantity {raw_quantity:?} is not a number"))
        })?;
        Ok(CartLine {
            name: self.session.text(&self.in_row(index, "productDescription")).await?,
            price: self.session.text(&self.in_row(index, "productPrice")).await?,
            quantity,
            total: self.session.text(&self.in_row(index, "productTotal")).await?,
        })
    }

    /// Retype a row's quantity and blur it to submit the change
    pub async fn update_product_quantity(&self, index: usize, quantity: u32) -> CheckResult<&Self> {
        info!(index, quantity, "update cart quantity");
        let field = self.in_row(index, "productQuantity");
        self.settled(async {
            self.session
                .type_text(&field, &quantity.to_string())
                .await?
                .blur(&field)
                .await?;
            Ok(())
        })
        .await?;
        Ok(self)
    }

    pub async fn remove_product_from_cart(&self, index: usize) -> CheckResult<&Self> {
        info!(index, "remove cart row");
        self.settled(async {
            self.click(self.in_row(index, "deleteButton")).await?;
            Ok(())
        })
        .await?;
        Ok(self)
    }

    /// Remove the row named `name`; a missing row is an assertion failure
    pub async fn remove_product_by_name(&self, name: &str) -> CheckResult<&Self> {
        let index = self
            .find_row(name)
            .await?
            .ok_or_else(|| CheckError::assertion(format!("no cart row for product {name:?}")))?;
        self.remove_product_from_cart(index).await
    }

    /// Delete rows one at a time until none remain
    pub async fn clear_cart(&self) -> CheckResult<&Self> {
        let rows = self.cart_items_count().await?;
        for _ in 0..rows {
            if self.cart_items_count().await? == 0 {
                break;
            }
            self.remove_product_from_cart(0).await?;
        }
        Ok(self)
    }

    /// Sum of the total cells inside the cart rows
    pub async fn cart_total(&self) -> CheckResult<f64> {
        let rows = self.cart_items_count().await?;
        let mut total = 0.0;
        for index in 0..rows {
            total += parse_currency(&self.session.text(&self.in_row(index, "productTotal")).await?)?;
        }
        Ok(total)
    }

    /// Recompute unit price × quantity over all rows and compare with the
    /// displayed total within [`TOTAL_TOLERANCE`]
    pub async fn verify_cart_total_calculation(&self) -> CheckResult<&Self> {
        let rows = self.cart_items_count().await?;
        let mut calculated = 0.0;
        for index in 0..rows {
            let line = self.product_details(index).await?;
            calculated += parse_currency(&line.price)? * f64::from(line.quantity);
        }
        let displayed = self.cart_total().await?;
        debug!(calculated, displayed, "cart total");
        expect((calculated - displayed).abs() <= TOTAL_TOLERANCE, || {
            format!("cart total {displayed} differs from recomputed {calculated} by more than {TOTAL_TOLERANCE}")
        })?;
        Ok(self)
    }

    pub async fn proceed_to_checkout(&self) -> CheckResult<&Self> {
        self.click("proceedCheckoutBtn").await
    }

    pub async fn verify_checkout_button(&self) -> CheckResult<&Self> {
        self.verify_visible("proceedCheckoutBtn").await?;
        self.verify_contains_text("proceedCheckoutBtn", "Proceed To Checkout")
            .await
    }

    /// Every column header visible inside the table head
    pub async fn verify_cart_table_headers(&self) -> CheckResult<&Self> {
        for header in TABLE_HEADERS {
            self.verify_visible(self.sel("cartTableHeader").contains(header))
                .await?;
        }
        Ok(self)
    }

    pub async fn verify_mobile_layout(&self) -> CheckResult<&Self> {
        self.session.set_viewport(Viewport::MOBILE).await?;
        self.verify_visible("cartTable").await
    }

    pub async fn verify_desktop_layout(&self) -> CheckResult<&Self> {
        self.session.set_viewport(Viewport::DESKTOP).await?;
        self.verify_visible("cartTable").await?;
        self.verify_cart_table_headers().await
    }

    pub async fn verify_recommended_items(&self) -> CheckResult<&Self> {
        self.scroll_to_element("recommendedItems").await?;
        self.verify_visible("recommendedItems").await
    }

    /// Add the `index`-th recommended item
    pub async fn add_recommended_item(&self, index: usize) -> CheckResult<&Self> {
        let target = self
            .sel("recommendedItems")
            .find(self.sel("recommendedAddBtn"))
            .nth(index);
        self.click(target).await
    }

    pub async fn verify_breadcrumb(&self) -> CheckResult<&Self> {
        self.verify_visible("breadcrumb").await?;
        self.verify_contains_text("breadcrumb", "Shopping Cart").await
    }

    pub async fn click_breadcrumb_home(&self) -> CheckResult<&Self> {
        self.click(self.sel("breadcrumb").contains("Home")).await
    }

    /// Leaving and re-opening the cart keeps the same rows
    pub async fn verify_cart_persistence(&self) -> CheckResult<&Self> {
        let before = self.cart_items_count().await?;
        self.session.visit("/").await?;
        self.visit().await?;
        self.verify_visible("cartTable").await?;
        let after = self.cart_items_count().await?;
        expect(before == after, || {
            format!("cart had {before} rows before leaving and {after} after returning")
        })?;
        Ok(self)
    }

    /// Opening the cart takes less than [`MAX_PAGE_LOAD`]
    pub async fn verify_page_load_time(&self) -> CheckResult<&Self> {
        let started = Instant::now();
        self.visit().await?;
        let elapsed = started.elapsed();
        info!(ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX), "cart page load");
        expect(elapsed < MAX_PAGE_LOAD, || {
            format!("cart page took {}ms to load", elapsed.as_millis())
        })?;
        Ok(self)
    }
}
