//! Catalog product records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;

/// Maximum number of gallery images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 4;

/// Image shown for products created without any uploaded images.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Errors raised while turning submitted fields into a [`Product`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// One of name, artisan, price or description is missing or blank.
    #[error("All fields are required")]
    MissingFields,
    /// Price is zero or negative.
    #[error("Price must be greater than zero")]
    InvalidPrice,
}

/// A catalog product.
///
/// `images` holds at most [`MAX_PRODUCT_IMAGES`] URIs and `image` is always
/// `images[0]` or the placeholder for records created here. Records seeded
/// from older snapshots may carry an `image` with no gallery at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub artisan: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tag: Option<String>,
    pub description: String,
    /// Last modification time, consulted only by timestamp-based sync.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Fields submitted to create a product.
///
/// Every field is optional at the wire level so that a missing field surfaces
/// as [`ProductError::MissingFields`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    pub name: String,
    pub artisan: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub description: String,
    pub tag: Option<String>,
    pub images: Vec<String>,
}

impl Product {
    /// Build a product from submitted fields.
    ///
    /// Text fields are trimmed, a blank tag becomes `None`, blank image
    /// entries are dropped and the gallery is truncated to
    /// [`MAX_PRODUCT_IMAGES`].
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::MissingFields`] if a required field is blank and
    /// [`ProductError::InvalidPrice`] if the price is not positive.
    pub fn create(
        id: ProductId,
        fields: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Self, ProductError> {
        let name = fields.name.trim();
        let artisan = fields.artisan.trim();
        let description = fields.description.trim();
        let Some(price) = fields.price else {
            return Err(ProductError::MissingFields);
        };
        if name.is_empty() || artisan.is_empty() || description.is_empty() {
            return Err(ProductError::MissingFields);
        }
        if price <= Decimal::ZERO {
            return Err(ProductError::InvalidPrice);
        }

        let images: Vec<String> = fields
            .images
            .into_iter()
            .map(|uri| uri.trim().to_owned())
            .filter(|uri| !uri.is_empty())
            .take(MAX_PRODUCT_IMAGES)
            .collect();
        let image = images
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());
        let tag = fields
            .tag
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        Ok(Self {
            id,
            name: name.to_owned(),
            artisan: artisan.to_owned(),
            price,
            image,
            images,
            tag,
            description: description.to_owned(),
            updated_at: now,
        })
    }
}
