use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use vendora_checkout::CheckoutError;
use vendora_core::DomainError;
use vendora_infra::FulfillmentError;

use crate::app::services::ServiceError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Checkout failure mapping: validation-class failures are 400,
/// retryable conflicts are 409.
pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::EmptyCart => json_error(StatusCode::BAD_REQUEST, "empty_cart", "cart is empty"),
        CheckoutError::UnknownProduct { .. } | CheckoutError::ProductUnavailable { .. } => {
            let message = err.to_string();
            json_error(StatusCode::BAD_REQUEST, "product_unavailable", message)
        }
        CheckoutError::InsufficientStock {
            ref name,
            available,
            ..
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": err.to_string(),
                "product_name": name,
                "available": available,
            })),
        )
            .into_response(),
        CheckoutError::Validation { ref field, ref message } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "field": field,
                "message": message,
            })),
        )
            .into_response(),
        CheckoutError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        CheckoutError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
        CheckoutError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::UnknownProduct(id) => json_error(
            StatusCode::NOT_FOUND,
            "unknown_product",
            format!("no product {id}"),
        ),
        ServiceError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}

pub fn fulfillment_error_to_response(err: FulfillmentError) -> axum::response::Response {
    match err {
        FulfillmentError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "order not found")
        }
        FulfillmentError::Domain(e) => domain_error_to_response(e),
        FulfillmentError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        FulfillmentError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
        FulfillmentError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}
