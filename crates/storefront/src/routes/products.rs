//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use tabletop_reboxing_core::Product;
use tabletop_reboxing_core::types::{CategoryId, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Product display data for listing grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub category_name: String,
    pub out_of_stock: bool,
    pub featured: bool,
}

impl ProductCardView {
    /// Build a card view, resolving the category name from the catalog.
    #[must_use]
    pub fn from_product(product: &Product, state: &AppState) -> Self {
        let category_name = state
            .catalog()
            .category(&product.category)
            .map_or(String::new(), |c| c.name.clone());

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
            category_name,
            out_of_stock: product.out_of_stock,
            featured: product.featured,
        }
    }
}

/// One specification row on the detail page.
#[derive(Clone)]
pub struct SpecView {
    pub label: String,
    pub value: String,
}

/// Product display data for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub gallery: Vec<String>,
    pub description: String,
    pub category_id: String,
    pub category_name: String,
    pub out_of_stock: bool,
    pub specs: Vec<SpecView>,
}

/// Category filter chip for the listing page.
#[derive(Clone)]
pub struct CategoryChipView {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    /// Optional category filter.
    pub category: Option<String>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/products.html")]
pub struct ProductsTemplate {
    pub products: Vec<ProductCardView>,
    pub chips: Vec<CategoryChipView>,
    pub active_category: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/product.html")]
pub struct ProductTemplate {
    pub product: ProductDetailView,
}

/// Product listing, optionally filtered to one category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let active_category = query
        .category
        .as_deref()
        .map(CategoryId::new)
        .filter(|id| state.catalog().category(id).is_some());

    let products: Vec<ProductCardView> = match &active_category {
        Some(category) => state
            .catalog()
            .products_in_category(category)
            .into_iter()
            .map(|p| ProductCardView::from_product(p, &state))
            .collect(),
        None => state
            .catalog()
            .visible_products()
            .map(|p| ProductCardView::from_product(p, &state))
            .collect(),
    };

    let chips = state
        .catalog()
        .categories()
        .iter()
        .map(|c| CategoryChipView {
            id: c.id.to_string(),
            name: c.name.clone(),
            active: active_category.as_ref() == Some(&c.id),
        })
        .collect();

    ProductsTemplate {
        products,
        chips,
        active_category: active_category.map(|c| c.to_string()),
    }
}

/// Product detail page.
///
/// Hidden products 404 like absent ones; out-of-stock products render with
/// the add-to-cart form disabled.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductTemplate> {
    let product_id = ProductId::new(id);
    let product = state
        .catalog()
        .product(&product_id)
        .filter(|p| p.is_visible())
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let category_name = state
        .catalog()
        .category(&product.category)
        .map_or(String::new(), |c| c.name.clone());

    Ok(ProductTemplate {
        product: ProductDetailView {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
            gallery: product.images.clone(),
            description: product.description.clone(),
            category_id: product.category.to_string(),
            category_name,
            out_of_stock: product.out_of_stock,
            specs: product
                .specs
                .iter()
                .map(|(label, value)| SpecView {
                    label: label.clone(),
                    value: value.clone(),
                })
                .collect(),
        },
    })
}
