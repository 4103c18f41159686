//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::search::SearchResults;
use crate::state::AppState;

/// Results shown per group in the suggestions dropdown.
const SUGGEST_LIMIT: usize = 4;

/// Results shown on the full search page.
const PAGE_LIMIT: usize = 50;

/// Search query parameters (shared by both endpoints).
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search suggestions template (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub results: SearchResults,
    pub is_ready: bool,
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/search.html")]
pub struct SearchPageTemplate {
    pub query: String,
    pub results: SearchResults,
    pub is_ready: bool,
}

/// Search suggestions endpoint (HTMX).
///
/// Returns an HTML fragment with results grouped by type, rendered under
/// the search box as the buyer types.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let query_str = query.q.trim();

    if query_str.is_empty() {
        return SearchResultsTemplate {
            results: SearchResults::default(),
            is_ready: state.search().is_ready(),
        }
        .into_response();
    }

    let results = state
        .search()
        .search(query_str, SUGGEST_LIMIT)
        .unwrap_or_default();

    SearchResultsTemplate {
        results,
        is_ready: state.search().is_ready(),
    }
    .into_response()
}

/// Full search page.
#[instrument(skip(state))]
pub async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let query_str = query.q.trim();

    let results = state
        .search()
        .search(query_str, PAGE_LIMIT)
        .unwrap_or_default();

    SearchPageTemplate {
        query: query.q.clone(),
        results,
        is_ready: state.search().is_ready(),
    }
    .into_response()
}
