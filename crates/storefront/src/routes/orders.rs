//! Order route handlers.
//!
//! Reads are always scoped by a reconciled identity: a cookie session for
//! `/orders/mine` and `/orders/{id}`, or a bearer credential whose verified
//! email matches the body of `/orders/by-email`.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use verdant_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::{BearerToken, OptionalAuth};
use crate::models::{Order, RecordedOrder};
use crate::services::{IdentityRequest, OrderConfirmation};
use crate::state::AppState;

/// `POST /orders` - record a payment confirmation.
///
/// Answers `201` for a new order and `200` when the payment session was
/// already recorded. A signed-in customer's session decides `userId`; a body
/// `userId` is only used for confirmations relayed without a session, which
/// come from the checkout flow after the payment processor has verified them.
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    payload: std::result::Result<Json<OrderConfirmation>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedOrder>)> {
    let Json(mut confirmation) = payload?;
    if let Some(user) = user {
        if confirmation.user_id.is_some_and(|id| id != user.id) {
            tracing::warn!(
                user_id = %user.id,
                "Ignoring body userId that differs from the session"
            );
        }
        confirmation.user_id = Some(user.id);
    }

    let recorded = state.orders().record_order(confirmation).await?;
    let status = if recorded.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(recorded)))
}

/// `GET /orders/mine` - the signed-in customer's orders, newest first.
pub async fn mine(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<Json<Vec<Order>>> {
    let identity = state
        .identity()
        .resolve(IdentityRequest::Session { current_user })
        .await?;

    let orders = state
        .orders()
        .fetch_orders_by_ownership(&identity.predicate())
        .await?;
    Ok(Json(orders))
}

/// Body of `POST /orders/by-email`.
#[derive(Debug, Deserialize)]
pub struct ByEmailRequest {
    pub email: String,
}

/// `POST /orders/by-email` - orders for an email the bearer has verified.
///
/// Answers `403` when the verified email differs from the requested one.
pub async fn by_email(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    payload: std::result::Result<Json<ByEmailRequest>, JsonRejection>,
) -> Result<Json<Vec<Order>>> {
    let Json(body) = payload?;

    let identity = state
        .identity()
        .resolve(IdentityRequest::BearerForEmail {
            token,
            requested_email: body.email,
        })
        .await?;

    let orders = state
        .orders()
        .fetch_orders_by_ownership(&identity.predicate())
        .await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}` - one of the signed-in customer's orders.
///
/// Another customer's order answers `404`, the same as a missing one.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let identity = state
        .identity()
        .resolve(IdentityRequest::Session { current_user })
        .await?;

    let not_found = || AppError::NotFound(format!("order {id}"));
    let order_id = id.parse::<i32>().map(OrderId::new).map_err(|_| not_found())?;

    state
        .orders()
        .fetch_order(order_id, &identity.predicate())
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
