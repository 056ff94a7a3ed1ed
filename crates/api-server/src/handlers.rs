//! Axum REST handlers for the dashboard API.

use crate::auth;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use slotdesk_core::config::ReminderConfig;
use slotdesk_core::DeskError;
use slotdesk_store::models::*;
use slotdesk_store::DeskStore;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DeskStore>,
    pub reminders: ReminderConfig,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map store errors onto HTTP status codes; the message is surfaced
/// verbatim to the UI.
fn error_response(err: DeskError) -> ApiError {
    let (status, code) = match &err {
        DeskError::Authentication(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        DeskError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        DeskError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
        DeskError::Constraint(_) => (StatusCode::CONFLICT, "constraint_violation"),
        DeskError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn handle_login(
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    auth::authenticate(&req).map(Json).map_err(error_response)
}

// ─── Accounts ──────────────────────────────────────────────────────────────

pub async fn list_accounts(State(state): State<AppState>) -> Json<Vec<Account>> {
    Json(state.store.list_accounts())
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, StatusCode> {
    state
        .store
        .get_account(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state
        .store
        .create_account(req, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.accounts.created").increment(1);
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Account>, StatusCode> {
    state
        .store
        .update_account(id, req, "admin")
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_account(id, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.accounts.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Account types ─────────────────────────────────────────────────────────

pub async fn list_account_types(State(state): State<AppState>) -> Json<Vec<AccountType>> {
    Json(state.store.list_account_types())
}

pub async fn create_account_type(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountTypeRequest>,
) -> (StatusCode, Json<AccountType>) {
    let account_type = state.store.create_account_type(req, "admin");
    (StatusCode::CREATED, Json(account_type))
}

pub async fn delete_account_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_account_type(id, "admin")
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Subscribers ───────────────────────────────────────────────────────────

pub async fn list_subscribers(State(state): State<AppState>) -> Json<Vec<Subscriber>> {
    Json(state.store.list_subscribers())
}

pub async fn get_subscriber(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscriber>, StatusCode> {
    state
        .store
        .get_subscriber(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_subscriber(
    State(state): State<AppState>,
    Json(req): Json<CreateSubscriberRequest>,
) -> Result<(StatusCode, Json<Subscriber>), ApiError> {
    let subscriber = state
        .store
        .create_subscriber(req, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscribers.created").increment(1);
    Ok((StatusCode::CREATED, Json(subscriber)))
}

pub async fn update_subscriber(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSubscriberRequest>,
) -> Result<Json<Subscriber>, StatusCode> {
    state
        .store
        .update_subscriber(id, req, "admin")
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_subscriber(id, "admin")
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriber_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OutstandingBalance>, ApiError> {
    state
        .store
        .outstanding_balance(id)
        .map(Json)
        .map_err(error_response)
}

// ─── Subscriptions ─────────────────────────────────────────────────────────

pub async fn list_subscriptions(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    Json(state.store.list_subscriptions())
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, StatusCode> {
    state
        .store
        .get_subscription(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let subscription = state
        .store
        .create_subscription(req, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscriptions.created").increment(1);
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn renew_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError> {
    let renewed = state
        .store
        .renew_subscription(id, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscriptions.renewed").increment(1);
    Ok(Json(renewed))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError> {
    let cancelled = state
        .store
        .cancel_subscription(id, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscriptions.cancelled").increment(1);
    Ok(Json(cancelled))
}

pub async fn suspend_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError> {
    let suspended = state
        .store
        .suspend_subscription(id, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscriptions.suspended").increment(1);
    Ok(Json(suspended))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_subscription(id, "admin")
        .map_err(error_response)?;
    metrics::counter!("desk.subscriptions.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_pending_renewals(
    State(state): State<AppState>,
) -> Json<Vec<Subscription>> {
    let flagged = state
        .store
        .mark_pending_renewals(state.reminders.pending_renewal_window_days, "admin");
    Json(flagged)
}

// ─── Reports ───────────────────────────────────────────────────────────────

pub async fn payment_reminders(State(state): State<AppState>) -> Json<PaymentReminders> {
    Json(
        state
            .store
            .payment_reminders(Utc::now(), state.reminders.upcoming_window_days),
    )
}

pub async fn dashboard_overview(State(state): State<AppState>) -> Json<DashboardOverview> {
    Json(state.store.dashboard_overview())
}

pub async fn audit_log(State(state): State<AppState>) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.get_audit_log())
}

pub async fn changes(State(state): State<AppState>) -> Json<ChangesResponse> {
    Json(ChangesResponse {
        revision: state.store.revision(),
    })
}

// ─── Operational ───────────────────────────────────────────────────────────

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

/// GET /ready — Readiness probe for Kubernetes.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
