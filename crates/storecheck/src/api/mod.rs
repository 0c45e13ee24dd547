//! Storefront JSON API: client, response model and body checks.

#[cfg(feature = "api")]
mod client;
mod types;

#[cfg(feature = "api")]
pub use client::{ApiClient, ApiRequest, RequestBody};
pub use types::{
    decode_body, duplicate_ids, is_valid_price, ApiResponse, Brand, BrandsBody, Category,
    ExpectedStructure, Product, ProductsBody, UserType,
};
