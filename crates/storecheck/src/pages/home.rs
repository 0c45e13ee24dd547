//! Landing page: navigation bar, hero carousel, featured products,
//! sidebar filters and footer.

use super::ModalChoice;
use crate::context::BrowserSession;
use crate::locator::{Selector, SelectorMap};
use crate::page_object::{expect, PageObject};
use crate::result::CheckResult;
use tracing::info;

const SELECTORS: &[(&str, &str)] = &[
    ("logo", ".logo img"),
    ("navigationMenu", ".navbar-nav"),
    ("homeLink", "a[href=\"/\"]"),
    ("productsLink", "a[href=\"/products\"]"),
    ("cartLink", "a[href=\"/view_cart\"]"),
    ("contactLink", "a[href=\"/contact_us\"]"),
    ("testCasesLink", "a[href=\"/test_cases\"]"),
    ("logoutLink", "a[href=\"/logout\"]"),
    ("deleteAccountLink", "a[href=\"/delete_account\"]"),
    ("heroSection", ".carousel"),
    ("heroSlide", ".carousel-inner .item"),
    ("nextSlideBtn", ".carousel-control-next"),
    ("prevSlideBtn", ".carousel-control-prev"),
    ("featuresSection", ".features_items"),
    ("featureProducts", ".features_items .col-sm-4"),
    ("productItem", ".productinfo"),
    ("productName", ".productinfo p"),
    ("productPrice", ".productinfo h2"),
    ("addToCartBtn", ".productinfo .btn"),
    ("viewProductBtn", ".choose .nav-pills li a"),
    ("categoriesPanel", ".left-sidebar .category-products"),
    ("categoryLinks", ".panel-body ul li a"),
    ("brandsPanel", ".brands_products"),
    ("brandLinks", ".brands_products ul li a"),
    ("footer", "#footer"),
    ("footerLinks", "#footer a"),
    ("subscriptionEmail", "#susbscribe_email"),
    ("subscribeBtn", "#subscribe"),
    ("scrollUpBtn", "#scrollUp"),
    ("searchInput", "#search_product"),
    ("searchBtn", "#submit_search"),
    ("cartModal", "#cartModal"),
    ("modalContinueBtn", ".modal-footer .btn-success"),
    ("modalViewCartBtn", ".modal-footer .btn-info"),
    ("recommendedItems", "#recommended-item-carousel"),
];

/// Categories at least one of which the sidebar must list
pub const KNOWN_CATEGORIES: [&str; 3] = ["WOMEN", "MEN", "KIDS"];

/// The store's landing page
#[derive(Debug, Clone)]
pub struct HomePage {
    session: BrowserSession,
    selectors: SelectorMap,
}

impl PageObject for HomePage {
    fn url(&self) -> &str {
        "/"
    }

    fn selectors(&self) -> &SelectorMap {
        &self.selectors
    }

    fn session(&self) -> &BrowserSession {
        &self.session
    }
}

impl HomePage {
    /// Bind the page to a session
    pub fn new(session: BrowserSession) -> CheckResult<Self> {
        Ok(Self {
            session,
            selectors: SelectorMap::from_pairs(SELECTORS.iter().copied())?,
        })
    }

    fn product_card(&self, index: usize) -> Selector {
        self.sel("featureProducts").nth(index)
    }

    /// Open the page and check it rendered
    pub async fn visit_home_page(&self) -> CheckResult<&Self> {
        self.visit().await?;
        self.verify_home_page().await
    }

    /// Logo and featured items visible, not bounced to login
    pub async fn verify_home_page(&self) -> CheckResult<&Self> {
        self.verify_visible("logo").await?;
        self.verify_visible("featuresSection").await?;
        self.session.expect_url_excludes("/login").await?;
        Ok(self)
    }

    pub async fn click_products(&self) -> CheckResult<&Self> {
        self.click("productsLink").await
    }

    pub async fn click_cart(&self) -> CheckResult<&Self> {
        self.click("cartLink").await
    }

    pub async fn click_contact(&self) -> CheckResult<&Self> {
        self.click("contactLink").await
    }

    pub async fn click_logout(&self) -> CheckResult<&Self> {
        self.click("logoutLink").await
    }

    /// Number of featured product cards
    pub async fn products_count(&self) -> CheckResult<usize> {
        Ok(self.session.elements(&self.sel("featureProducts")).await?.len())
    }

    /// Open the details of the `index`-th card
    pub async fn click_product_by_index(&self, index: usize) -> CheckResult<&Self> {
        let target = self.product_card(index).find(self.sel("viewProductBtn"));
        self.click(target).await
    }

    /// Add the `index`-th card to the cart
    pub async fn add_product_to_cart_by_index(&self, index: usize) -> CheckResult<&Self> {
        info!(index, "add featured product to cart");
        let target = self.product_card(index).find(self.sel("addToCartBtn"));
        self.click(target).await
    }

    pub async fn product_name_by_index(&self, index: usize) -> CheckResult<String> {
        let target = self.product_card(index).find(self.sel("productName"));
        self.session.text(&target).await
    }

    pub async fn product_price_by_index(&self, index: usize) -> CheckResult<String> {
        let target = self.product_card(index).find(self.sel("productPrice"));
        self.session.text(&target).await
    }

    pub async fn verify_hero_carousel(&self) -> CheckResult<&Self> {
        self.verify_visible("heroSection").await
    }

    pub async fn click_next_slide(&self) -> CheckResult<&Self> {
        self.click("nextSlideBtn").await
    }

    pub async fn click_prev_slide(&self) -> CheckResult<&Self> {
        self.click("prevSlideBtn").await
    }

    /// Click a top-level category in the sidebar
    pub async fn click_category(&self, name: &str) -> CheckResult<&Self> {
        self.click(self.sel("categoriesPanel").contains(name)).await
    }

    /// Click a subcategory link
    pub async fn click_subcategory(&self, name: &str) -> CheckResult<&Self> {
        self.click(self.sel("categoryLinks").has_text(name)).await
    }

    /// Sidebar visible and lists a known category, case-insensitively
    pub async fn verify_category_section(&self) -> CheckResult<&Self> {
        self.verify_visible("categoriesPanel").await?;
        let text = self.session.text(&self.sel("categoriesPanel")).await?.to_uppercase();
        expect(KNOWN_CATEGORIES.iter().any(|c| text.contains(c)), || {
            format!(
                "sidebar should contain at least one known category: {}",
                KNOWN_CATEGORIES.join(", ")
            )
        })?;
        Ok(self)
    }

    pub async fn click_brand(&self, name: &str) -> CheckResult<&Self> {
        self.click(self.sel("brandsPanel").contains(name)).await
    }

    pub async fn verify_brands_section(&self) -> CheckResult<&Self> {
        self.verify_visible("brandsPanel").await?;
        self.verify_contains_text("brandsPanel", "Brands").await
    }

    pub async fn subscribe_to_newsletter(&self, email: &str) -> CheckResult<&Self> {
        self.type_text("subscriptionEmail", email).await?;
        self.click("subscribeBtn").await
    }

    pub async fn verify_footer(&self) -> CheckResult<&Self> {
        self.verify_visible("footer").await
    }

    pub async fn click_footer_link(&self, text: &str) -> CheckResult<&Self> {
        self.click(self.sel("footer").contains(text)).await
    }

    pub async fn click_scroll_up_button(&self) -> CheckResult<&Self> {
        self.click("scrollUpBtn").await
    }

    /// The scroll-up button shows once the page is scrolled down
    pub async fn verify_scroll_up_button(&self) -> CheckResult<&Self> {
        self.scroll_to_bottom().await?;
        self.verify_visible("scrollUpBtn").await
    }

    pub async fn verify_logged_in_user(&self, username: &str) -> CheckResult<&Self> {
        self.verify_contains_text("navigationMenu", &format!("Logged in as {username}"))
            .await
    }

    pub async fn delete_account(&self) -> CheckResult<&Self> {
        self.click("deleteAccountLink").await
    }

    /// Search, if this page has a search box; a no-op otherwise
    pub async fn search_product(&self, term: &str) -> CheckResult<&Self> {
        if self.session.exists_now(&self.sel("searchInput")).await? {
            self.type_text("searchInput", term).await?;
            self.click("searchBtn").await?;
        } else {
            tracing::debug!(term, "no search box on home page");
        }
        Ok(self)
    }

    /// Dismiss the add-to-cart modal and wait for it to close
    pub async fn handle_add_to_cart_modal(&self, choice: ModalChoice) -> CheckResult<&Self> {
        self.verify_visible("cartModal").await?;
        match choice {
            ModalChoice::Continue => self.click("modalContinueBtn").await?,
            ModalChoice::ViewCart => self.click("modalViewCartBtn").await?,
        };
        self.verify_not_visible("cartModal").await
    }

    /// Featured section visible, titled, and not empty
    pub async fn verify_featured_products_section(&self) -> CheckResult<&Self> {
        self.verify_visible("featuresSection").await?;
        self.verify_contains_text("featuresSection", "Features Items").await?;
        self.session
            .verify_count(&self.sel("featureProducts"), "more than 0", |n| n > 0)
            .await?;
        Ok(self)
    }

    pub async fn verify_recommended_items_section(&self) -> CheckResult<&Self> {
        self.scroll_to_element("recommendedItems").await?;
        self.verify_visible("recommendedItems").await
    }
}
