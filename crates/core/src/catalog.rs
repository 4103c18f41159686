//! Catalog data model.
//!
//! The catalog is an injected, read-only list of products and categories.
//! Nothing in this crate fetches it; the storefront loads it from JSON at
//! startup and the cart only ever copies snapshot fields out of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, Rupees};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Category this product belongs to.
    pub category: CategoryId,
    /// Unit price in whole rupees.
    pub price: Rupees,
    /// Primary display image path.
    pub image: String,
    /// Additional gallery images.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Shown on the home page.
    #[serde(default)]
    pub featured: bool,
    /// Hidden products are excluded from every listing and detail page.
    #[serde(default)]
    pub hidden: bool,
    /// Out-of-stock products are listed but cannot be added to the cart.
    #[serde(default)]
    pub out_of_stock: bool,
    /// Free-form specification rows (material, dimensions, ...).
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl Product {
    /// Whether the product may appear on any storefront surface.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Whether the product can currently be added to the cart.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_visible() && !self.out_of_stock
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Icon slug used by the category tiles.
    #[serde(default)]
    pub icon: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(hidden: bool, out_of_stock: bool) -> Product {
        Product {
            id: ProductId::new("wingspan-insert"),
            name: "Wingspan Organizer Insert".to_owned(),
            category: CategoryId::new("organizer-inserts"),
            price: Rupees::new(1_299),
            image: "/static/images/products/wingspan-insert.jpg".to_owned(),
            images: Vec::new(),
            description: String::new(),
            featured: false,
            hidden,
            out_of_stock,
            specs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_visibility_flags() {
        assert!(product(false, false).is_visible());
        assert!(!product(true, false).is_visible());
    }

    #[test]
    fn test_purchasable_requires_stock_and_visibility() {
        assert!(product(false, false).is_purchasable());
        assert!(!product(false, true).is_purchasable());
        assert!(!product(true, false).is_purchasable());
    }

    #[test]
    fn test_deserialize_defaults_optional_fields() {
        let json = r#"{
            "id": "meeple-tray",
            "name": "Stackable Meeple Tray",
            "category": "organizer-inserts",
            "price": 449,
            "image": "/static/images/products/meeple-tray.jpg"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(!product.hidden);
        assert!(!product.out_of_stock);
        assert!(product.specs.is_empty());
    }
}
