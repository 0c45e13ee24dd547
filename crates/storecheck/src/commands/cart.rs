//! Cart commands: adding from product pages, editing rows, totals.

use crate::context::BrowserSession;
use crate::locator::Selector;
use crate::pages::{CartPage, ExpectedLine, ModalChoice};
use crate::result::CheckResult;
use crate::wait::{self, SettlePolicy};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Default pause between consecutive adds
pub const DEFAULT_PACE: Duration = Duration::from_millis(1000);

/// Product and quantity for [`CartCommands::add_multiple`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog id
    pub product_id: u32,
    /// Units, at least 1
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

impl CartItem {
    /// `quantity` units of `product_id`
    #[must_use]
    pub const fn new(product_id: u32, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Cart commands bound to a session
#[derive(Debug, Clone)]
pub struct CartCommands {
    session: BrowserSession,
    settle: SettlePolicy,
    pace: Duration,
}

impl CartCommands {
    /// Commands over `session`
    #[must_use]
    pub fn new(session: BrowserSession) -> Self {
        Self {
            session,
            settle: SettlePolicy::default(),
            pace: DEFAULT_PACE,
        }
    }

    /// Use a different settle step after mutations
    #[must_use]
    pub const fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Pause between adds in [`CartCommands::add_multiple`]
    #[must_use]
    pub const fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Cart page sharing this session and settle policy
    pub fn cart_page(&self) -> CheckResult<CartPage> {
        Ok(CartPage::new(self.session.clone())?.with_settle(self.settle))
    }

    async fn settled<T>(&self, action: impl Future<Output = CheckResult<T>>) -> CheckResult<T> {
        let probes = [
            Selector::css("#cart_info_table tbody tr"),
            Selector::css(".cart_total_price"),
        ];
        wait::settle_after(self.session.driver(), &probes, self.settle, action).await
    }

    /// Add from the product page and dismiss the confirmation modal
    ///
    /// The modal closing (or the cart URL, for [`ModalChoice::ViewCart`])
    /// marks the add as done.
    pub async fn add_to_cart(&self, product_id: u32, quantity: u32, choice: ModalChoice) -> CheckResult<&Self> {
        info!(product_id, quantity, ?choice, "add to cart");
        let modal = Selector::css("#cartModal");
        self.session
            .visit(&format!("/product_details/{product_id}"))
            .await?;
        if quantity > 1 {
            self.session
                .type_text(&Selector::css("#quantity"), &quantity.to_string())
                .await?;
        }
        self.session
            .click(&Selector::css(".btn.btn-default.cart"))
            .await?
            .verify_visible(&modal)
            .await?;
        match choice {
            ModalChoice::Continue => {
                self.session
                    .click(&Selector::css(".modal-footer .btn.btn-success"))
                    .await?
                    .verify_not_visible(&modal)
                    .await?;
            }
            ModalChoice::ViewCart => {
                self.session
                    .click(&modal.clone().find(r#"a[href="/view_cart"]"#))
                    .await?
                    .expect_url_contains("/view_cart")
                    .await?;
            }
        }
        Ok(self)
    }

    /// Add each item in order, pausing between items
    pub async fn add_multiple(&self, items: &[CartItem]) -> CheckResult<&Self> {
        info!(count = items.len(), "add multiple to cart");
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pace).await;
            }
            self.add_to_cart(item.product_id, item.quantity, ModalChoice::Continue)
                .await?;
        }
        Ok(self)
    }

    /// Open the cart from the menu
    pub async fn view_cart(&self) -> CheckResult<&Self> {
        self.session
            .click(&Selector::css(r#"a[href="/view_cart"]"#).visible().first())
            .await?
            .expect_url_contains("/view_cart")
            .await?
            .verify_visible(&Selector::css(".cart_info"))
            .await?;
        Ok(self)
    }

    /// Delete the `index`-th row (0-based)
    pub async fn remove_from_cart(&self, index: usize) -> CheckResult<&Self> {
        info!(index, "remove from cart");
        self.settled(async {
            self.session
                .click(&Selector::css(".cart_quantity_delete").nth(index))
                .await?;
            Ok(())
        })
        .await?;
        Ok(self)
    }

    /// Retype the `index`-th row's quantity and blur to submit
    pub async fn update_cart_quantity(&self, index: usize, quantity: u32) -> CheckResult<&Self> {
        info!(index, quantity, "update cart quantity");
        let field = Selector::css(".cart_quantity_input").nth(index);
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

    /// Sum of the displayed row totals
    pub async fn cart_total(&self) -> CheckResult<f64> {
        self.cart_page()?.cart_total().await
    }

    /// A row named `name` exists and matches `expected`
    pub async fn verify_cart_item(&self, name: &str, expected: &ExpectedLine) -> CheckResult<&Self> {
        self.cart_page()?.verify_product_in_cart(name, expected).await?;
        Ok(self)
    }

    /// Open the cart and delete every row
    pub async fn clear_cart(&self) -> CheckResult<&Self> {
        info!("clear cart");
        self.view_cart().await?;
        self.cart_page()?.clear_cart().await?;
        Ok(self)
    }

    pub async fn proceed_to_checkout(&self) -> CheckResult<&Self> {
        self.session
            .click(&Selector::css(".btn.btn-default.check_out"))
            .await?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::CheckError;
    use crate::test_support::Storefront;

    fn commands(store: &Storefront) -> CartCommands {
        CartCommands::new(store.session.clone()).with_settle(SettlePolicy::fixed_ms(10))
    }

    mod add_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_add_with_quantity_and_continue() {
            let store = Storefront::new();
            let cart = commands(&store);
            cart.add_to_cart(2, 3, ModalChoice::Continue).await.unwrap();
            assert_eq!(store.cart(), vec![(2, 3)]);
            assert!(store.url().ends_with("/product_details/2"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_add_then_view_cart() {
            let store = Storefront::new();
            let cart = commands(&store);
            cart.add_to_cart(1, 1, ModalChoice::ViewCart).await.unwrap();
            assert!(store.url().ends_with("/view_cart"));
            cart.verify_cart_item("Blue Top", &ExpectedLine::new().with_quantity(1))
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_add_multiple_paces_between_items() {
            let store = Storefront::new();
            let cart = commands(&store).with_pace(Duration::from_millis(500));
            let started = tokio::time::Instant::now();
            cart.add_multiple(&[CartItem::new(1, 1), CartItem::new(3, 2), CartItem::new(4, 1)])
                .await
                .unwrap();
            assert_eq!(store.cart(), vec![(1, 1), (3, 2), (4, 1)]);
            assert!(started.elapsed() >= Duration::from_millis(1000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unknown_product_fails() {
            let store = Storefront::new();
            let err = commands(&store)
                .add_to_cart(42, 1, ModalChoice::Continue)
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::ElementNotFound { .. }));
        }

        #[test]
        fn test_item_quantity_defaults_to_one() {
            let item: CartItem = serde_json::from_str(r#"{"productId": 7}"#).unwrap();
            assert_eq!(item, CartItem::new(7, 1));
        }
    }

    mod edit_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_update_remove_and_total() {
            let store = Storefront::new().with_cart(&[(1, 1), (2, 1)]);
            store.session.visit("/").await.unwrap();
            let cart = commands(&store);
            cart.view_cart().await.unwrap();
            cart.update_cart_quantity(0, 4).await.unwrap();
            assert_eq!(store.cart(), vec![(1, 4), (2, 1)]);
            assert!((cart.cart_total().await.unwrap() - 2400.0).abs() < f64::EPSILON);
            cart.remove_from_cart(1).await.unwrap();
            assert_eq!(store.cart(), vec![(1, 4)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_and_checkout() {
            let store = Storefront::new().with_cart(&[(1, 1), (3, 2), (4, 1)]);
            store.session.visit("/").await.unwrap();
            let cart = commands(&store);
            cart.clear_cart().await.unwrap();
            assert!(store.cart().is_empty());
            cart.cart_page().unwrap().verify_cart_is_empty().await.unwrap();
            cart.proceed_to_checkout().await.unwrap();
            assert!(store.url().ends_with("/checkout"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_waits_for_slow_server() {
            let store = Storefront::new().with_cart(&[(1, 1), (2, 1)]).with_latency(600);
            store.session.visit("/view_cart").await.unwrap();
            let cart = CartCommands::new(store.session.clone());
            cart.remove_from_cart(0).await.unwrap();
            assert_eq!(store.cart(), vec![(2, 1)]);
            assert_eq!(cart.cart_page().unwrap().cart_items_count().await.unwrap(), 1);
            cart.verify_cart_item("Men Tshirt", &ExpectedLine::new()).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_update_waits_for_slow_server() {
            let store = Storefront::new().with_cart(&[(1, 1)]).with_latency(600);
            store.session.visit("/view_cart").await.unwrap();
            let cart = CartCommands::new(store.session.clone());
            cart.update_cart_quantity(0, 3).await.unwrap();
            assert!((cart.cart_total().await.unwrap() - 1500.0).abs() < f64::EPSILON);
            cart.verify_cart_item("Blue Top", &ExpectedLine::new().with_quantity(3))
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_verify_missing_item() {
            let store = Storefront::new().with_cart(&[(1, 1)]);
            store.session.visit("/view_cart").await.unwrap();
            let err = commands(&store)
                .verify_cart_item("Men Tshirt", &ExpectedLine::new())
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::AssertionFailed { .. }));
        }
    }
}
