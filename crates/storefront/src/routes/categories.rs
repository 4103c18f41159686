//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use tabletop_reboxing_core::types::CategoryId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Category display data for the tiles grid.
#[derive(Clone)]
pub struct CategoryCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub product_count: usize,
}

/// Category listing template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/categories.html")]
pub struct CategoriesTemplate {
    pub categories: Vec<CategoryCardView>,
}

/// Category detail template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/category.html")]
pub struct CategoryTemplate {
    pub category: CategoryCardView,
    pub products: Vec<ProductCardView>,
}

/// Build the card view for one category.
fn card_view(state: &AppState, category: &tabletop_reboxing_core::Category) -> CategoryCardView {
    CategoryCardView {
        id: category.id.to_string(),
        name: category.name.clone(),
        description: category.description.clone(),
        icon: category.icon.clone(),
        product_count: state.catalog().products_in_category(&category.id).len(),
    }
}

/// Category listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let categories = state
        .catalog()
        .categories()
        .iter()
        .map(|c| card_view(&state, c))
        .collect();

    CategoriesTemplate { categories }
}

/// Category detail page with its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<CategoryTemplate> {
    let category_id = CategoryId::new(id);
    let category = state
        .catalog()
        .category(&category_id)
        .ok_or_else(|| AppError::NotFound(format!("category {category_id}")))?;

    let products = state
        .catalog()
        .products_in_category(&category_id)
        .into_iter()
        .map(|p| ProductCardView::from_product(p, &state))
        .collect();

    Ok(CategoryTemplate {
        category: card_view(&state, category),
        products,
    })
}
