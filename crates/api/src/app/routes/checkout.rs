use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use vendora_checkout::CheckoutRequest;
use vendora_core::AddressId;
use vendora_orders::PaymentMethod;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::BuyerContext;

pub fn router() -> Router {
    Router::new().route("/", post(checkout))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Json(body): Json<dto::CheckoutRequestBody>,
) -> axum::response::Response {
    let Some(payment_method) = PaymentMethod::parse(&body.payment_method) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "payment_method must be one of: bank_transfer, wire_transfer, check",
        );
    };

    let saved_address_id: Option<AddressId> = match body.saved_address_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid saved_address_id",
                )
            }
        },
    };

    let request = CheckoutRequest {
        shipping_address: body.shipping_address,
        saved_address_id,
        payment_method,
        note: body.note,
        idempotency_key: body.idempotency_key,
    };

    match services.checkout(buyer.buyer_id(), request) {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
