use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use vendora_core::{ActorId, BuyerId};
use vendora_orders::ActorKind;

use crate::context::{ActorContext, BuyerContext};

/// Require a buyer identity (`X-Buyer-Id`) on the request.
///
/// Authentication itself happens upstream; a missing or malformed header
/// means the gateway did not vouch for the caller.
pub async fn require_buyer(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let buyer_id: BuyerId = header_value(req.headers(), "x-buyer-id")?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(BuyerContext::new(buyer_id));
    Ok(next.run(req).await)
}

/// Require a fulfillment actor (`X-Actor-Id` + `X-Actor-Kind`) on the
/// request.
pub async fn require_actor(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let actor_id: ActorId = header_value(req.headers(), "x-actor-id")?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let kind = ActorKind::parse(header_value(req.headers(), "x-actor-kind")?)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(ActorContext::new(actor_id, kind));
    Ok(next.run(req).await)
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();

    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(value)
}
