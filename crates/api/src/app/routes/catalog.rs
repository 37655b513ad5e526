//! Catalog seeding/read surface.
//!
//! Catalog management proper (restocks, vendor listing workflows) is an
//! external collaborator; these routes exist so operators and tests can
//! populate and inspect the store the pipeline runs against.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use vendora_catalog::{CatalogCode, Product};
use vendora_core::{ProductId, VendorId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let vendor_id: VendorId = match body.vendor_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id")
        }
    };

    let code = match CatalogCode::parse(body.catalog_code) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let product = match Product::new(
        ProductId::new(),
        vendor_id,
        body.vendor_name,
        code,
        body.name,
        body.unit_price,
        body.quantity_in_stock,
    ) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_product(product) {
        Ok(stored) => (StatusCode::CREATED, Json(dto::product_to_json(&stored))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_products() {
        Ok(products) => {
            let items: Vec<_> = products.iter().map(dto::product_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match services.get_product(product_id) {
        Ok(Some(stored)) => (StatusCode::OK, Json(dto::product_to_json(&stored))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}
