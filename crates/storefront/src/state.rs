//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::content::ContentStore;
use crate::search::SearchIndex;
use crate::services::notify::OrderNotifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the loaded catalog and content, the search index, and
/// the notification transport.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogStore,
    content: ContentStore,
    search: SearchIndex,
    notifier: Arc<dyn OrderNotifier>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: CatalogStore,
        content: ContentStore,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                content,
                search: SearchIndex::new(),
                notifier,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    /// Get a reference to the content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the search index.
    #[must_use]
    pub fn search(&self) -> &SearchIndex {
        &self.inner.search
    }

    /// Get the order notification transport.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn OrderNotifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Start building the search index in the background.
    pub fn start_search_indexing(&self) {
        crate::search::build_index_async(
            self.inner.search.clone(),
            self.inner.catalog.clone(),
            self.inner.content.clone(),
        );
    }
}
