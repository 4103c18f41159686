//! Tabletop Re-Boxing Storefront - Public e-commerce site.
//!
//! This binary serves the public-facing storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for interactivity
//! - Askama templates for server-side rendering
//! - Static JSON catalog loaded at startup (no database)
//! - Session-backed cart and checkout state (in-memory store)
//! - Tantivy search index built in the background
//! - EmailJS for best-effort order notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabletop_reboxing_storefront::catalog::CatalogStore;
use tabletop_reboxing_storefront::config::StorefrontConfig;
use tabletop_reboxing_storefront::content::ContentStore;
use tabletop_reboxing_storefront::routes;
use tabletop_reboxing_storefront::services::notify::{
    EmailJsNotifier, NoopNotifier, OrderNotifier,
};
use tabletop_reboxing_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tabletop_reboxing_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Load the catalog and content into memory
    let catalog = CatalogStore::load(&config.catalog_dir).expect("Failed to load catalog");
    tracing::info!(
        products = catalog.products().len(),
        categories = catalog.categories().len(),
        "Catalog loaded"
    );

    let content = ContentStore::load(&config.content_dir).expect("Failed to load content");

    // Order notification transport; runs without one when unconfigured
    let notifier: Arc<dyn OrderNotifier> = match config.emailjs.clone() {
        Some(emailjs) => Arc::new(EmailJsNotifier::new(emailjs)),
        None => {
            tracing::warn!("EMAILJS_* not set; order notifications will only be logged");
            Arc::new(NoopNotifier)
        }
    };

    // Build application state
    let state = AppState::new(config.clone(), catalog, content, notifier);

    // Start building search index in background
    state.start_search_indexing();
    tracing::info!("Search index build started (async)");

    // Build router
    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
