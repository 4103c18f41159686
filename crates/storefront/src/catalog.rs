//! Catalog store: the injected, read-only product/category list.
//!
//! The catalog is loaded once at startup from two JSON files and shared via
//! `Arc`. Nothing mutates it at runtime; the storefront, the search indexer
//! and the CLI all read the same snapshot.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use tabletop_reboxing_core::types::{CategoryId, ProductId};
use tabletop_reboxing_core::{Category, Product};

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {file}: {message}")]
    Io { file: String, message: String },
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}

/// In-memory catalog shared across handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    inner: Arc<CatalogInner>,
}

#[derive(Debug)]
struct CatalogInner {
    products: Vec<Product>,
    categories: Vec<Category>,
    products_by_id: HashMap<ProductId, usize>,
    categories_by_id: HashMap<CategoryId, usize>,
}

impl CatalogStore {
    /// Build a store from already-loaded lists.
    ///
    /// Later duplicates of an id shadow earlier ones in the lookup maps;
    /// `trb-cli catalog validate` reports duplicates as a data error.
    #[must_use]
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        let products_by_id = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let categories_by_id = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Self {
            inner: Arc::new(CatalogInner {
                products,
                categories,
                products_by_id,
                categories_by_id,
            }),
        }
    }

    /// Load `products.json` and `categories.json` from a directory.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if either file cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let products: Vec<Product> = load_json(&dir.join("products.json"))?;
        let categories: Vec<Category> = load_json(&dir.join("categories.json"))?;
        Ok(Self::new(products, categories))
    }

    /// Look up a product by id (including hidden products - callers that
    /// serve pages filter on visibility themselves).
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.inner
            .products_by_id
            .get(id)
            .and_then(|&i| self.inner.products.get(i))
    }

    /// All products, including hidden ones (CLI and indexer use).
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.inner.products
    }

    /// Products that may appear on storefront surfaces, in catalog order.
    pub fn visible_products(&self) -> impl Iterator<Item = &Product> {
        self.inner.products.iter().filter(|p| p.is_visible())
    }

    /// Visible products flagged for the home page.
    #[must_use]
    pub fn featured_products(&self) -> Vec<&Product> {
        self.visible_products().filter(|p| p.featured).collect()
    }

    /// Visible products belonging to a category, in catalog order.
    #[must_use]
    pub fn products_in_category(&self, category: &CategoryId) -> Vec<&Product> {
        self.visible_products()
            .filter(|p| &p.category == category)
            .collect()
    }

    /// All categories, in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.inner.categories
    }

    /// Look up a category by id.
    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.inner
            .categories_by_id
            .get(id)
            .and_then(|&i| self.inner.categories.get(i))
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let file = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
        file: file.clone(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
        file,
        message: e.to_string(),
    })
}
