//! Markdown content page handlers (about, shipping & care guide).

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub title: String,
    pub description: Option<String>,
    pub content_html: String,
}

/// Render a markdown content page by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ContentPageTemplate> {
    let page = state
        .content()
        .get_page(&slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(ContentPageTemplate {
        title: page.meta.title.clone(),
        description: page.meta.description.clone(),
        content_html: page.content_html.clone(),
    })
}
