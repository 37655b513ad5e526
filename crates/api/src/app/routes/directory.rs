//! Buyer-directory seeding surface.
//!
//! Vendor registration/approval is an external collaborator; this route
//! lets operators and tests seed the profiles checkout reads.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use vendora_checkout::BuyerProfile;
use vendora_core::BuyerId;

use crate::app::services::AppServices;
use crate::app::dto;

pub fn router() -> Router {
    Router::new().route("/", post(register_buyer))
}

pub async fn register_buyer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterBuyerRequest>,
) -> axum::response::Response {
    let buyer_id = BuyerId::new();
    services.register_buyer(BuyerProfile {
        buyer_id,
        name: body.name,
        email: body.email,
        default_address: body.default_address,
        saved_addresses: Vec::new(),
    });

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "buyer_id": buyer_id.to_string() })),
    )
        .into_response()
}
