//! Dashboard API router — mounts all endpoints under /api/v1.

use crate::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;

/// Build the dashboard router with all endpoints.
pub fn desk_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/v1/auth/login", post(handlers::handle_login))
        // Accounts
        .route("/api/v1/accounts", get(handlers::list_accounts).post(handlers::create_account))
        .route("/api/v1/accounts/{id}", get(handlers::get_account).put(handlers::update_account).delete(handlers::delete_account))
        // Account types
        .route("/api/v1/account-types", get(handlers::list_account_types).post(handlers::create_account_type))
        .route("/api/v1/account-types/{id}", axum::routing::delete(handlers::delete_account_type))
        // Subscribers
        .route("/api/v1/subscribers", get(handlers::list_subscribers).post(handlers::create_subscriber))
        .route("/api/v1/subscribers/{id}", get(handlers::get_subscriber).put(handlers::update_subscriber).delete(handlers::delete_subscriber))
        .route("/api/v1/subscribers/{id}/balance", get(handlers::subscriber_balance))
        // Subscriptions
        .route("/api/v1/subscriptions", get(handlers::list_subscriptions).post(handlers::create_subscription))
        .route("/api/v1/subscriptions/{id}", get(handlers::get_subscription).delete(handlers::delete_subscription))
        .route("/api/v1/subscriptions/{id}/renew", post(handlers::renew_subscription))
        .route("/api/v1/subscriptions/{id}/cancel", post(handlers::cancel_subscription))
        .route("/api/v1/subscriptions/{id}/suspend", post(handlers::suspend_subscription))
        .route("/api/v1/subscriptions/pending-renewals", post(handlers::mark_pending_renewals))
        // Reports
        .route("/api/v1/reminders", get(handlers::payment_reminders))
        .route("/api/v1/overview", get(handlers::dashboard_overview))
        .route("/api/v1/audit-log", get(handlers::audit_log))
        .route("/api/v1/changes", get(handlers::changes))
        .with_state(state)
}
