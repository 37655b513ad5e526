use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use vendora_core::{OrderId, VendorId};
use vendora_infra::StatusChange;
use vendora_orders::{FulfillmentStatus, PaymentStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, BuyerContext};

/// Buyer-facing order reads.
pub fn buyer_router() -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
}

/// Vendor/admin-facing fulfillment writes.
pub fn actor_router() -> Router {
    Router::new()
        .route("/orders/:id/status", post(update_status))
        .route("/orders/:id/payment", post(update_payment))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
) -> axum::response::Response {
    match services.list_orders(buyer.buyer_id()) {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    match services.get_order(buyer.buyer_id(), order_id) {
        Ok(Some(order)) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    let Some(status) = FulfillmentStatus::parse(&body.status) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "status must be one of: pending, confirmed, processing, packed, shipped, delivered, cancelled",
        );
    };

    let vendor_id: Option<VendorId> = match body.vendor_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid vendor id",
                )
            }
        },
    };

    let change = StatusChange {
        vendor_id,
        status,
        actor_id: actor.actor_id(),
        actor_kind: actor.kind(),
        tracking_number: body.tracking_number,
        carrier: body.carrier,
        note: body.note,
        occurred_at: Utc::now(),
    };

    match services.update_order_status(order_id, change) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn update_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePaymentRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    let Some(status) = PaymentStatus::parse(&body.status) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "payment status must be one of: unpaid, paid, refunded",
        );
    };

    match services.set_payment_status(order_id, status) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}
