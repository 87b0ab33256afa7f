//! pkv-web library - venue discovery HTTP service
//!
//! JSON API over the venue catalog plus server-rendered detail pages that
//! carry SEO head tags.

use axum::Router;
use pkv_common::config::{ListingConfig, TomlConfig};
use pkv_common::contact::ContactInbox;
use pkv_common::images::ImageResolver;
use pkv_common::recommend::Recommender;
use pkv_common::seo::SeoBuilder;
use pkv_common::Catalog;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable venue catalog
    pub catalog: Arc<Catalog>,
    /// Image resolver with its result cache
    pub images: Arc<ImageResolver>,
    pub recommender: Arc<Recommender>,
    pub seo: Arc<SeoBuilder>,
    /// Contact inbox; `None` when the contact form is disabled
    pub contact: Option<Arc<ContactInbox>>,
    pub listing: ListingConfig,
}

impl AppState {
    /// Create application state from loaded components and config
    pub fn new(
        catalog: Catalog,
        images: ImageResolver,
        config: &TomlConfig,
        contact: Option<ContactInbox>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            images: Arc::new(images),
            recommender: Arc::new(Recommender::new(config.recommend.clone())),
            seo: Arc::new(SeoBuilder::new(config.site.clone())),
            contact: contact.map(Arc::new),
            listing: config.listing.clone(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/categories", get(api::list_categories))
        .route("/api/cities", get(api::list_cities))
        .route("/api/tags", get(api::list_tags))
        .route("/api/venues", get(api::list_venues))
        .route("/api/venues/:category", get(api::list_category_venues))
        .route("/api/venues/:category/:id", get(api::get_venue))
        .route("/api/search", get(api::search_venues))
        .route("/api/recommendations", get(api::get_recommendations))
        .route("/api/images/cache", get(api::image_cache_stats).delete(api::clear_image_cache))
        .route("/api/images/:category/:id", get(api::get_venue_image))
        .route("/api/contact", post(api::submit_contact));

    let pages = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/static/placeholder.svg", get(api::serve_placeholder))
        .route("/search", get(api::search_page))
        .route("/venues/:category", get(api::listing_page))
        .route("/venues/:category/:id", get(api::venue_page));

    Router::new()
        .merge(api)
        .merge(pages)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
