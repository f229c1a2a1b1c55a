//! Axum router configuration for the fulfillment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    get_invite_link, handle_webhook, health, retrieve_invite_link, service_status,
    FulfillmentAppState,
};

/// Create the fulfillment API router.
///
/// # Routes
///
/// ## Provider-facing (no auth; signature verified on the raw body)
/// - `POST /webhook` - payment provider event deliveries
///
/// ## Client-facing
/// - `POST /get-invite-link` - bounded polling invite lookup
/// - `GET /retrieve-invite-link/{payment_id}` - single-shot invite read
pub fn fulfillment_routes() -> Router<FulfillmentAppState> {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/get-invite-link", post(get_invite_link))
        .route("/retrieve-invite-link/:payment_id", get(retrieve_invite_link))
}

/// Create the operational router.
///
/// # Routes
/// - `GET /health` - liveness probe
/// - `GET /status` - config-presence report
pub fn system_routes() -> Router<FulfillmentAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(service_status))
}

/// Create the complete application router.
pub fn app_router() -> Router<FulfillmentAppState> {
    Router::new()
        .merge(fulfillment_routes())
        .merge(system_routes())
}
