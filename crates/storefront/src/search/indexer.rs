//! Search index builder.
//!
//! Builds the search index asynchronously from the catalog and local
//! content pages.

use tantivy::Index;
use tracing::{error, info, instrument, warn};

use crate::catalog::CatalogStore;
use crate::content::ContentStore;

use super::{DocType, SearchFields, SearchIndex};

/// Spawn a background task to build the search index.
///
/// The index is populated asynchronously. Until complete,
/// `SearchIndex::search()` returns empty results.
pub fn build_index_async(search_index: SearchIndex, catalog: CatalogStore, content: ContentStore) {
    tokio::spawn(async move {
        match build_index(&catalog, &content) {
            Ok((index, fields)) => {
                if let Err(e) = search_index.set_ready(index, fields) {
                    error!(error = %e, "Failed to set search index as ready");
                } else {
                    let docs = search_index.num_docs();
                    info!(docs, "Search index is now ready and serving requests");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to build search index");
            }
        }
    });
}

/// Build the search index (called by the background task).
#[instrument(skip_all)]
fn build_index(
    catalog: &CatalogStore,
    content: &ContentStore,
) -> Result<(Index, SearchFields), super::SearchError> {
    let (schema, fields) = SearchIndex::build_schema();

    let index = Index::create_in_ram(schema);

    // Register the English stemmer tokenizer
    let tokenizer_manager = index.tokenizers();
    tokenizer_manager.register(
        "en_stem",
        tantivy::tokenizer::TextAnalyzer::builder(tantivy::tokenizer::SimpleTokenizer::default())
            .filter(tantivy::tokenizer::RemoveLongFilter::limit(40))
            .filter(tantivy::tokenizer::LowerCaser)
            .filter(tantivy::tokenizer::Stemmer::new(
                tantivy::tokenizer::Language::English,
            ))
            .build(),
    );

    let mut writer = index
        .writer(50_000_000) // 50MB buffer
        .map_err(|e| super::SearchError::Index(format!("Failed to create writer: {e}")))?;

    let products_count = index_products(catalog, &writer, &fields);
    let categories_count = index_categories(catalog, &writer, &fields);
    let pages_count = index_pages(content, &writer, &fields);

    writer
        .commit()
        .map_err(|e| super::SearchError::Index(format!("Failed to commit index: {e}")))?;

    let total = products_count + categories_count + pages_count;
    info!(
        products = products_count,
        categories = categories_count,
        pages = pages_count,
        total,
        "Search index built"
    );

    Ok((index, fields))
}

/// Index all visible products, tagging each with its category name.
fn index_products(
    catalog: &CatalogStore,
    writer: &tantivy::IndexWriter,
    fields: &SearchFields,
) -> usize {
    let mut count = 0;

    for product in catalog.visible_products() {
        let category_name = catalog
            .category(&product.category)
            .map_or(String::new(), |c| c.name.clone());
        let specs_text = product
            .specs
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let available = u64::from(!product.out_of_stock);

        let doc = tantivy::doc!(
            fields.doc_type => DocType::Product.as_str(),
            fields.id => product.id.as_str(),
            fields.title => product.name.clone(),
            fields.description => product.description.clone(),
            fields.image_url => product.image.clone(),
            fields.price => product.price.to_string(),
            fields.available => available,
            fields.title_text => product.name.clone(),
            fields.description_text => product.description.clone(),
            fields.tags_text => format!("{category_name} {specs_text}")
        );

        if let Err(e) = writer.add_document(doc) {
            warn!(error = %e, id = %product.id, "Failed to index product");
        } else {
            count += 1;
        }
    }

    count
}

/// Index all categories.
fn index_categories(
    catalog: &CatalogStore,
    writer: &tantivy::IndexWriter,
    fields: &SearchFields,
) -> usize {
    let mut count = 0;

    for category in catalog.categories() {
        let doc = tantivy::doc!(
            fields.doc_type => DocType::Category.as_str(),
            fields.id => category.id.as_str(),
            fields.title => category.name.clone(),
            fields.description => category.description.clone(),
            fields.image_url => String::new(),
            fields.price => String::new(),
            fields.available => 1u64, // Categories are always "available"
            fields.title_text => category.name.clone(),
            fields.description_text => category.description.clone(),
            fields.tags_text => String::new()
        );

        if let Err(e) = writer.add_document(doc) {
            warn!(error = %e, id = %category.id, "Failed to index category");
        } else {
            count += 1;
        }
    }

    count
}

/// Index all pages from local content.
fn index_pages(
    content: &ContentStore,
    writer: &tantivy::IndexWriter,
    fields: &SearchFields,
) -> usize {
    let mut count = 0;

    for page in content.get_all_pages() {
        let doc = tantivy::doc!(
            fields.doc_type => DocType::Page.as_str(),
            fields.id => page.slug.clone(),
            fields.title => page.meta.title.clone(),
            fields.description => page.meta.description.clone().unwrap_or_default(),
            fields.image_url => String::new(),
            fields.price => String::new(),
            fields.available => 1u64, // Pages are always "available"
            fields.title_text => page.meta.title.clone(),
            fields.description_text => strip_html(&page.content_html),
            fields.tags_text => String::new()
        );

        if let Err(e) = writer.add_document(doc) {
            warn!(error = %e, slug = %page.slug, "Failed to index page");
        } else {
            count += 1;
        }
    }

    count
}

/// Strip HTML tags from a string.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Fits the <em>base game</em> &amp; expansions</p>"),
            "Fits the base game & expansions"
        );
    }
}
