//! # Request Handlers
//!
//! Axum request handlers for the checkout API.
//! Order creation reconciles the client amount before anything reaches the
//! processor; processor answers are passed back unchanged.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use checkout_core::{reconcile, CreateOrderRequest, OrderPayload, PaymentError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let Some(detail) = err.detail() {
        response = response.with_detail(detail);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Plain-text liveness probe
pub async fn root() -> &'static str {
    "ok"
}

/// Health check endpoint
pub async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "storefront-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a processor order from the cart
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected order body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid request body", 400)),
        )
    })?;

    let reconciliation =
        reconcile(&request, &state.config.policy).map_err(payment_error_to_response)?;

    info!(
        "Creating order: {} lines, item_total={}, discount={}, net={} {}",
        reconciliation.line_items.len(),
        reconciliation.item_total.value(),
        reconciliation.discount.value(),
        reconciliation.net.value(),
        reconciliation.currency
    );

    let order = OrderPayload::capture(
        reconciliation.into_purchase_unit(),
        state.application_context(),
    );

    let created = state.gateway.create_order(&order).await.map_err(|e| {
        error!("Failed to create order: {}", e);
        payment_error_to_response(e)
    })?;

    Ok(Json(created))
}

/// Capture an approved order
#[instrument(skip(state))]
pub async fn capture_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let captured = state
        .gateway
        .capture_order(&order_id)
        .await
        .map_err(|e| {
            error!("Failed to capture order {}: {}", order_id, e);
            payment_error_to_response(e)
        })?;

    Ok(Json(captured))
}

/// SDK settings so the storefront and server stay in sync
pub async fn sdk_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "clientId": state.paypal.client_id,
        "currency": state.config.policy.default_currency,
        "intent": "capture",
        "env": state.paypal.environment(),
    }))
}

/// Client token for the hosted card fields
#[instrument(skip(state))]
pub async fn client_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let token = state
        .gateway
        .client_token()
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(json!({ "client_token": token })))
}

/// Verify credentials against the processor
pub async fn ping(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.gateway.ping().await.map_err(payment_error_to_response)?;
    Ok(Json(json!({ "ok": true })))
}

/// Non-secret view of the processor configuration
pub async fn debug_env(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "base": state.paypal.api_base_url,
        "clientIdSuffix": state.paypal.client_id_suffix(),
        "hasSecret": state.paypal.has_secret(),
    }))
}
