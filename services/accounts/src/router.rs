use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use unilink_core::health::{healthz, readyz};
use unilink_core::middleware::request_id_layer;

use crate::handlers::{
    admin::admin_delete,
    deletion::{confirm_deletion, request_deletion},
    login::login,
    otp::{request_otp, verify_otp},
    register::register,
    token::check_token,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OTP / registration
        .route("/auth/otp", post(request_otp))
        .route("/auth/otp/verify", post(verify_otp))
        .route("/auth/register", post(register))
        // Session
        .route("/auth/login", post(login))
        .route("/auth/token", get(check_token))
        // Deletion lifecycle
        .route("/accounts/@me/deletion", post(request_deletion))
        .route("/accounts/@me/deletion/confirm", post(confirm_deletion))
        .route("/admin/accounts/{account_id}", delete(admin_delete))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
