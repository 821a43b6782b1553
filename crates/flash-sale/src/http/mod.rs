//! # HTTP Surface
//!
//! | Route | Success | Failure |
//! |-------|---------|---------|
//! | `POST /buy` | 200 `{"status":"queued","orderId":..}` | 400 `{"error":"sold out"}`, 503 when worth retrying |
//! | `GET /stock` | 200 `{"stock":n}` | 500 `{"error":"Failed to read stock"}` |
//! | `POST /reset-stock/{count}` | 200 `Stock reset to n` | 400 `Invalid stock count.` |
//!
//! Sold out and "try again" get different status codes so a client can tell them apart.

use crate::model::BuyerId;
use crate::reservation::{PurchaseOutcome, ReservationError, ReservationService};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Optional body of `POST /buy`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyRequest {
    user_id: Option<String>,
}

pub fn router(service: Arc<ReservationService>) -> Router {
    Router::new()
        .route("/buy", post(buy))
        .route("/stock", get(stock))
        .route("/reset-stock/{count}", post(reset_stock))
        .with_state(service)
}

/// A missing, empty or unparseable body buys as the default buyer.
fn buyer_from(body: &[u8]) -> BuyerId {
    serde_json::from_slice::<BuyRequest>(body)
        .ok()
        .and_then(|request| request.user_id)
        .filter(|id| !id.trim().is_empty())
        .map(BuyerId::new)
        .unwrap_or_default()
}

async fn buy(State(service): State<Arc<ReservationService>>, body: Bytes) -> Response {
    let buyer = buyer_from(&body);
    match service.attempt_purchase(buyer).await {
        Ok(PurchaseOutcome::Granted(order_id)) => (
            StatusCode::OK,
            Json(json!({ "status": "queued", "orderId": order_id })),
        )
            .into_response(),
        Ok(PurchaseOutcome::SoldOut) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "sold out" })),
        )
            .into_response(),
        Err(e) => failure(e),
    }
}

fn failure(e: ReservationError) -> Response {
    if e.is_transient() {
        warn!(error = %e, "Purchase attempt failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string(), "retry": true })),
        )
            .into_response()
    } else {
        error!(error = %e, "Purchase attempt rejected");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response()
    }
}

async fn stock(State(service): State<Arc<ReservationService>>) -> Response {
    match service.remaining().await {
        Ok(units) => (StatusCode::OK, Json(json!({ "stock": units }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read stock");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read stock" })),
            )
                .into_response()
        }
    }
}

async fn reset_stock(
    State(service): State<Arc<ReservationService>>,
    Path(count): Path<String>,
) -> Response {
    let units = match count.trim().parse::<u64>() {
        Ok(units) if units >= 1 => units,
        _ => return (StatusCode::BAD_REQUEST, "Invalid stock count.").into_response(),
    };

    match service.reset(units).await {
        Ok(()) => (StatusCode::OK, format!("Stock reset to {units}")).into_response(),
        Err(ReservationError::InvalidQuantity(_)) => {
            (StatusCode::BAD_REQUEST, "Invalid stock count.").into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to reset stock");
            (StatusCode::SERVICE_UNAVAILABLE, "Failed to reset stock").into_response()
        }
    }
}
