//! Concrete page objects.

mod cart;
mod home;

pub use cart::{CartLine, CartPage, ExpectedLine, MAX_PAGE_LOAD, TABLE_HEADERS, TOTAL_TOLERANCE};
pub use home::{HomePage, KNOWN_CATEGORIES};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which button dismisses the add-to-cart modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalChoice {
    /// "Continue Shopping": stay on the page
    #[default]
    Continue,
    /// "View Cart": go to the cart
    ViewCart,
}

impl FromStr for ModalChoice {
    type Err = crate::result::CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "view_cart" | "view-cart" | "viewcart" => Ok(Self::ViewCart),
            other => Err(crate::result::CheckError::Config {
                message: format!("unknown modal choice '{other}'"),
            }),
        }
    }
}
