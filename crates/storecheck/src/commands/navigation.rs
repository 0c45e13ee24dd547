//! Site navigation commands.

use crate::context::BrowserSession;
use crate::locator::Selector;
use crate::page_object::expect;
use crate::result::{CheckError, CheckResult};
use crate::wait::{self, SettlePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Top-level site section reachable from the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// `/`
    Home,
    /// `/products`
    Products,
    /// `/view_cart`
    Cart,
    /// `/contact_us`
    Contact,
    /// `/test_cases`
    TestCases,
}

impl Section {
    /// Every section, in menu order
    pub const ALL: [Self; 5] = [
        Self::Home,
        Self::Products,
        Self::Cart,
        Self::Contact,
        Self::TestCases,
    ];

    /// Menu link that opens the section
    #[must_use]
    pub fn link(self) -> Selector {
        match self {
            Self::Home => Selector::css(r#"a[href="/"]"#).first(),
            Self::Products => Selector::css(r#"a[href="/products"]"#),
            Self::Cart => Selector::css(r#"a[href="/view_cart"]"#).visible().first(),
            Self::Contact => Selector::css(r#"a[href="/contact_us"]"#),
            Self::TestCases => Selector::css(r#"a[href="/test_cases"]"#),
        }
    }

    /// URL fragment checked after arriving; home has none
    #[must_use]
    pub const fn url_fragment(self) -> Option<&'static str> {
        match self {
            Self::Home => None,
            Self::Products => Some("/products"),
            Self::Cart => Some("/view_cart"),
            Self::Contact => Some("/contact_us"),
            Self::TestCases => Some("/test_cases"),
        }
    }
}

impl FromStr for Section {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "products" => Ok(Self::Products),
            "cart" => Ok(Self::Cart),
            "contact" => Ok(Self::Contact),
            "test cases" | "test_cases" => Ok(Self::TestCases),
            _ => Err(CheckError::UnknownSection {
                section: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Home => "home",
            Self::Products => "products",
            Self::Cart => "cart",
            Self::Contact => "contact",
            Self::TestCases => "test cases",
        };
        f.write_str(name)
    }
}

/// How to dismiss an open modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalAction {
    /// Header close button
    #[default]
    Close,
    /// Primary or success button
    Confirm,
    /// Secondary or default button
    Cancel,
}

impl ModalAction {
    /// Lenient parse: `ok` confirms, anything unknown closes
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "confirm" | "ok" => Self::Confirm,
            "cancel" => Self::Cancel,
            _ => Self::Close,
        }
    }

    /// Button that performs the action
    #[must_use]
    pub fn button(self) -> Selector {
        match self {
            Self::Close => Selector::css(".modal .close, .modal-header .close"),
            Self::Confirm => Selector::css(".modal-footer .btn-primary, .modal-footer .btn-success"),
            Self::Cancel => Selector::css(".modal-footer .btn-secondary, .modal-footer .btn-default"),
        }
    }
}

/// Navigation commands bound to a session
#[derive(Debug, Clone)]
pub struct NavigationCommands {
    session: BrowserSession,
    settle: SettlePolicy,
}

impl NavigationCommands {
    /// Commands over `session`
    #[must_use]
    pub fn new(session: BrowserSession) -> Self {
        Self {
            session,
            settle: SettlePolicy::default(),
        }
    }

    /// Use a different settle step after pagination
    #[must_use]
    pub const fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Underlying session
    #[must_use]
    pub const fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Open a section from the menu
    ///
    /// Section names are parsed first, so an unknown name fails with
    /// [`CheckError::UnknownSection`] before anything touches the page.
    pub async fn navigate_to(&self, section: &str) -> CheckResult<&Self> {
        let section: Section = section.parse()?;
        self.open(section).await
    }

    /// Open a known section
    pub async fn open(&self, section: Section) -> CheckResult<&Self> {
        info!(%section, "navigate");
        self.session.click(&section.link()).await?;
        if let Some(fragment) = section.url_fragment() {
            self.session.expect_url_contains(fragment).await?;
        }
        Ok(self)
    }

    /// Search from the products page and land on the results
    pub async fn search_products(&self, term: &str) -> CheckResult<&Self> {
        info!(term, "search products");
        self.open(Section::Products).await?;
        self.session
            .type_text(&Selector::css("#search_product"), term)
            .await?
            .click(&Selector::css("#submit_search"))
            .await?
            .verify_visible(&Selector::css(".features_items"))
            .await?
            .verify_contains_text(&Selector::css("h2"), "Searched Products")
            .await?;
        Ok(self)
    }

    /// Pick a category in the sidebar, then optionally a subcategory
    pub async fn filter_by_category(&self, category: &str, subcategory: Option<&str>) -> CheckResult<&Self> {
        info!(category, subcategory, "filter by category");
        self.open(Section::Products).await?;
        self.session
            .click(&Selector::css(".panel-group").contains(category))
            .await?;
        if let Some(sub) = subcategory {
            self.session
                .click(&Selector::css(".panel-body").contains(sub))
                .await?;
        }
        self.session
            .verify_visible(&Selector::css(".features_items"))
            .await?;
        Ok(self)
    }

    pub async fn filter_by_brand(&self, brand: &str) -> CheckResult<&Self> {
        info!(brand, "filter by brand");
        self.open(Section::Products).await?;
        self.session
            .click(&Selector::css(".brands_products").contains(brand))
            .await?
            .verify_visible(&Selector::css(".features_items"))
            .await?;
        Ok(self)
    }

    /// Open `/product_details/<id>`
    pub async fn view_product_details(&self, product_id: u32) -> CheckResult<&Self> {
        self.session
            .visit(&format!("/product_details/{product_id}"))
            .await?
            .verify_visible(&Selector::css(".product-information"))
            .await?;
        Ok(self)
    }

    /// Click a pagination link and let the listing settle
    pub async fn go_to_page(&self, page: u32) -> CheckResult<&Self> {
        info!(page, "go to page");
        let probes = [Selector::css(".features_items .col-sm-4")];
        let link = Selector::css(".pagination").contains(page.to_string());
        wait::settle_after(self.session.driver(), &probes, self.settle, async {
            self.session.click(&link).await?;
            Ok(())
        })
        .await?;
        Ok(self)
    }

    pub async fn scroll_to_element(&self, selector: &str) -> CheckResult<&Self> {
        self.session.scroll_into_view(&Selector::css(selector)).await?;
        Ok(self)
    }

    pub async fn click_breadcrumb(&self, text: &str) -> CheckResult<&Self> {
        self.session
            .click(&Selector::css(".breadcrumb").contains(text))
            .await?;
        Ok(self)
    }

    /// Dismiss the open modal and wait for it to hide
    pub async fn handle_modal(&self, action: ModalAction) -> CheckResult<&Self> {
        let modal = Selector::css(".modal");
        info!(?action, "handle modal");
        self.session
            .verify_visible(&modal)
            .await?
            .click(&action.button())
            .await?
            .verify_not_visible(&modal)
            .await?;
        Ok(self)
    }

    /// Whether the first match lies fully inside the configured viewport
    ///
    /// An element with no layout box is an assertion failure, not `false`.
    pub async fn is_in_viewport(&self, selector: &str) -> CheckResult<bool> {
        let target = Selector::css(selector);
        let found = self.session.elements(&target).await?;
        let bbox = found
            .first()
            .and_then(|e| e.bounding_box)
            .ok_or_else(|| CheckError::assertion(format!("{target} has no layout box")))?;
        Ok(bbox.inside(self.session.config().viewport))
    }

    /// Assert the first match is fully inside the viewport
    pub async fn verify_in_viewport(&self, selector: &str) -> CheckResult<&Self> {
        let inside = self.is_in_viewport(selector).await?;
        expect(inside, || format!("{selector} is outside the viewport"))?;
        Ok(self)
    }
}
