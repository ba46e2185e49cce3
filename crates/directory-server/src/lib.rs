//! Local Business Directory Server
//!
//! Serves business profile pages, per-location landing pages, sitemaps and
//! the business creation flow. Catalog pages come from a read-only table
//! loaded at startup; created businesses live in the hosted backend.
//!
//! ## Endpoints
//!
//! - `GET /businesses` - Directory listing (`?category=` filter)
//! - `GET /businesses/{slug}` - Business page
//! - `GET /businesses/{slug}/{location}` - Location page
//! - `GET /business/{id}` - Business created through the form
//! - `GET|POST /business/new` - Creation form (requires a session)
//! - `POST /api/businesses` - Create a business from JSON
//! - `GET /api/businesses/{slug}` - Catalog record as JSON
//! - `GET /sitemap.xml` - Sitemap index
//! - `GET /health` - Health check

pub mod backend;
pub mod config;
pub mod handlers;
pub mod memory;
pub mod render;
pub mod sitemap;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use backend::{Backend, StoredBusiness, User};
pub use handlers::AppState;
pub use memory::InMemoryBackend;
pub use storage::RedisBackend;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        // Pages
        .route("/", get(handlers::directory_handler))
        .route("/businesses", get(handlers::directory_handler))
        .route("/businesses/{slug}", get(handlers::business_handler))
        .route(
            "/businesses/{slug}/{location}",
            get(handlers::location_handler),
        )
        .route(
            "/business/new",
            get(handlers::new_business_form_handler).post(handlers::create_business_form_handler),
        )
        .route("/business/{id}", get(handlers::stored_business_handler))
        // JSON API
        .route("/api/businesses", post(handlers::api_create_business_handler))
        .route(
            "/api/businesses/{slug}",
            get(handlers::api_get_business_handler),
        )
        // SEO
        .route("/sitemap.xml", get(handlers::sitemap_index_handler))
        .route(
            "/sitemap-businesses.xml",
            get(handlers::businesses_sitemap_handler),
        )
        .route(
            "/sitemap-locations.xml",
            get(handlers::locations_sitemap_handler),
        )
        .route("/robots.txt", get(handlers::robots_handler))
        .fallback(handlers::fallback_handler)
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
