//! HTTP application wiring (Axum router + service wiring).
//!
//! Folder layout:
//! - `services.rs`: infrastructure wiring (stores, bus, committer)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and
/// the black-box tests).
pub async fn build_app(config: &ApiConfig) -> Router {
    let services = Arc::new(services::build_services(config).await);

    // Buyer-facing surface: cart, checkout and order reads.
    let buyer_routes = Router::new()
        .nest("/cart", routes::cart::router())
        .nest("/checkout", routes::checkout::router())
        .merge(routes::orders::buyer_router())
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn(middleware::require_buyer));

    // Vendor/admin-facing surface: fulfillment status + payment label.
    let actor_routes = routes::orders::actor_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn(middleware::require_actor));

    // Operational surface: health plus catalog/directory seeding for the
    // external collaborators that own those records.
    let operational = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/products", routes::catalog::router())
        .nest("/buyers", routes::directory::router())
        .layer(Extension(services));

    Router::new()
        .merge(buyer_routes)
        .merge(actor_routes)
        .merge(operational)
        .layer(ServiceBuilder::new())
}
