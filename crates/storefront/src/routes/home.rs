//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::routes::categories::CategoryCardView;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Number of featured products shown on the home page.
const FEATURED_LIMIT: usize = 8;

/// Static hero copy for the landing section.
pub struct HeroView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

impl Default for HeroView {
    fn default() -> Self {
        Self {
            title: "Give your games a better box",
            subtitle: "Hand-finished organizer inserts, trays and custom boxes \
                       that make setup faster and teardown painless.",
            button_text: "Shop Products",
            button_url: "/products",
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub hero: HeroView,
    pub featured: Vec<ProductCardView>,
    pub categories: Vec<CategoryCardView>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    // Featured products, topped up with the first visible products when the
    // catalog flags fewer than the grid needs.
    let mut featured: Vec<ProductCardView> = state
        .catalog()
        .featured_products()
        .into_iter()
        .take(FEATURED_LIMIT)
        .map(|p| ProductCardView::from_product(p, &state))
        .collect();
    if featured.len() < FEATURED_LIMIT {
        for product in state.catalog().visible_products() {
            if featured.len() >= FEATURED_LIMIT {
                break;
            }
            if !product.featured {
                featured.push(ProductCardView::from_product(product, &state));
            }
        }
    }

    let categories = state
        .catalog()
        .categories()
        .iter()
        .map(|c| CategoryCardView {
            id: c.id.to_string(),
            name: c.name.clone(),
            description: c.description.clone(),
            icon: c.icon.clone(),
            product_count: state.catalog().products_in_category(&c.id).len(),
        })
        .collect();

    HomeTemplate {
        hero: HeroView::default(),
        featured,
        categories,
    }
}
