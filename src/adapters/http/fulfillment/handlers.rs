//! HTTP handlers for the fulfillment endpoints.
//!
//! These handlers connect Axum routes to the application layer. The webhook
//! handler passes the raw body bytes straight through: signature
//! verification must see exactly what the provider sent.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::application::handlers::fulfillment::{
    GetInviteLinkHandler, InviteLookupState, PollConfig, ProcessWebhookCommand,
    ProcessWebhookHandler, RetrieveInviteLinkHandler,
};
use crate::domain::foundation::DomainError;
use crate::domain::fulfillment::{
    FulfillmentError, FulfillmentSettings, WebhookSignatureVerifier,
};
use crate::ports::{
    BatchRepository, FulfillmentQueue, PaymentRepository, ProcessingLockStore, UserRepository,
};

use super::dto::{
    ConfigReport, ErrorResponse, GetInviteLinkRequest, HealthResponse, InviteFailureResponse,
    InviteSuccessResponse, ServiceStatusResponse, WebhookAck,
};

/// Header carrying the provider's HMAC signature.
const SIGNATURE_HEADER: &str = "x-razorpay-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct FulfillmentAppState {
    pub payments: Arc<dyn PaymentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub batches: Arc<dyn BatchRepository>,
    pub locks: Arc<dyn ProcessingLockStore>,
    pub queue: Arc<dyn FulfillmentQueue>,
    pub verifier: WebhookSignatureVerifier,
    pub settings: FulfillmentSettings,
    pub poll: PollConfig,
    pub config_report: ConfigReport,
}

impl FulfillmentAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.verifier.clone(),
            self.payments.clone(),
            self.users.clone(),
            self.batches.clone(),
            self.locks.clone(),
            self.queue.clone(),
            self.settings.clone(),
        )
    }

    pub fn poll_handler(&self) -> GetInviteLinkHandler {
        GetInviteLinkHandler::new(
            self.payments.clone(),
            self.users.clone(),
            self.batches.clone(),
            self.poll.clone(),
        )
    }

    pub fn retrieve_handler(&self) -> RetrieveInviteLinkHandler {
        RetrieveInviteLinkHandler::new(
            self.payments.clone(),
            self.users.clone(),
            self.batches.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Handle a payment provider webhook delivery.
pub async fn handle_webhook(
    State(state): State<FulfillmentAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = ProcessWebhookCommand {
        raw_body: body.to_vec(),
        signature,
    };

    let outcome = state.webhook_handler().handle(cmd).await?;
    Ok(Json(WebhookAck::from(outcome)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Retrieval Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /get-invite-link - Poll for the invite until fulfillment lands.
pub async fn get_invite_link(
    State(state): State<FulfillmentAppState>,
    Json(request): Json<GetInviteLinkRequest>,
) -> Result<Response, ApiError> {
    let handler = state.poll_handler();

    match handler.handle(&request.payment_id).await? {
        Some(found) => {
            let response = InviteSuccessResponse {
                success: true,
                invite_link: found.invite_link,
                batch_type: found.batch_name,
                status: None,
                message: "Retrieved stored invite link",
            };
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        None => {
            let response = InviteFailureResponse {
                success: false,
                error: "Invite link not found. Please check your email for the invite link.",
                status: None,
            };
            Ok((StatusCode::NOT_FOUND, Json(response)).into_response())
        }
    }
}

/// GET /retrieve-invite-link/{payment_id} - Single-shot invite read.
///
/// No polling, no processing; returns whatever is currently persisted plus
/// the payment's coarse status so the client can tell "not yet processed",
/// "failed", and "still processing" apart.
pub async fn retrieve_invite_link(
    State(state): State<FulfillmentAppState>,
    Path(payment_id): Path<String>,
) -> Result<Response, ApiError> {
    let handler = state.retrieve_handler();
    let lookup = handler.handle(&payment_id).await?;

    match lookup {
        InviteLookupState::Ready {
            invite_link,
            batch_name,
            status,
        } => {
            let response = InviteSuccessResponse {
                success: true,
                invite_link,
                batch_type: batch_name,
                status: Some(status.as_str().to_string()),
                message: "Invite link retrieved successfully",
            };
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        not_ready => {
            let response = InviteFailureResponse {
                success: false,
                error: "Invite link not available yet. Please check your email.",
                status: Some(not_ready.status_str()),
            };
            Ok((StatusCode::NOT_FOUND, Json(response)).into_response())
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Operational Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /status - Config-presence report for operators.
pub async fn service_status(
    State(state): State<FulfillmentAppState>,
) -> Json<ServiceStatusResponse> {
    Json(ServiceStatusResponse {
        server: "running",
        timestamp: Utc::now().to_rfc3339(),
        environment: state.config_report.clone(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts pipeline errors to HTTP responses.
pub struct ApiError(FulfillmentError);

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(FulfillmentError::Infrastructure(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            FulfillmentError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid signature"),
            ),
            FulfillmentError::MalformedPayload(message) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            FulfillmentError::QueueUnavailable(_) | FulfillmentError::Infrastructure(_) => {
                // Internal detail stays in the logs; the provider only needs
                // to know to retry.
                tracing::error!(error = %self.0, "webhook request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal Server Error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
