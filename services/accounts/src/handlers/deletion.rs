use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unilink_auth_types::identity::IdentityHeaders;

use crate::error::AccountServiceError;
use crate::handlers::{client_ip, user_agent};
use crate::state::AppState;
use crate::usecase::deletion::{
    ConfirmDeletionInput, ConfirmDeletionUseCase, RequestDeletionInput, RequestDeletionUseCase,
};

// ── POST /accounts/@me/deletion ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestDeletionRequest {
    pub password: String,
    pub reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDeletionResponse {
    pub request_id: String,
    #[serde(serialize_with = "unilink_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

pub async fn request_deletion(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    headers: HeaderMap,
    Json(body): Json<RequestDeletionRequest>,
) -> Result<(StatusCode, Json<RequestDeletionResponse>), AccountServiceError> {
    let usecase = RequestDeletionUseCase {
        accounts: state.account_repo(),
        mailer: state.mailer.clone(),
        delete_otp_ttl_secs: state.config.delete_otp_ttl_secs,
        app_name: state.config.app_name.clone(),
        echo_codes: state.config.echo_codes,
    };

    let out = usecase
        .execute(RequestDeletionInput {
            account_id: identity.account_id,
            password: body.password,
            reason: body.reason,
            ip: client_ip(&headers),
            user_agent: user_agent(&headers),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestDeletionResponse {
            request_id: out.request_id,
            expires_at: out.expires_at,
            otp: out.otp,
        }),
    ))
}

// ── POST /accounts/@me/deletion/confirm ───────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeletionRequest {
    pub request_id: String,
    pub otp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeletionResponse {
    pub status: &'static str,
    #[serde(serialize_with = "unilink_core::serde::to_rfc3339_ms")]
    pub confirmed_at: DateTime<Utc>,
    /// True when the post-deletion confirmation email could not be delivered.
    pub mailer_error: bool,
}

pub async fn confirm_deletion(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<ConfirmDeletionRequest>,
) -> Result<Json<ConfirmDeletionResponse>, AccountServiceError> {
    let usecase = ConfirmDeletionUseCase {
        accounts: state.account_repo(),
        mailer: state.mailer.clone(),
        app_name: state.config.app_name.clone(),
    };

    let out = usecase
        .execute(ConfirmDeletionInput {
            account_id: identity.account_id,
            request_id: body.request_id,
            otp: body.otp,
        })
        .await?;

    Ok(Json(ConfirmDeletionResponse {
        status: "deleted",
        confirmed_at: out.confirmed_at,
        mailer_error: out.mailer_error,
    }))
}
