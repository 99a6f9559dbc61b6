use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

use unilink_domain::account::Purpose;

use crate::error::AccountServiceError;
use crate::handlers::{client_ip, user_agent};
use crate::state::AppState;
use crate::usecase::otp::{RequestOtpInput, RequestOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};

fn parse_purpose(raw: Option<&str>) -> Result<Purpose, AccountServiceError> {
    match raw {
        None => Ok(Purpose::Register),
        Some(v) => Purpose::from_str_value(v).ok_or(AccountServiceError::InvalidPurpose),
    }
}

// ── POST /auth/otp ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestOtpRequest {
    pub email: String,
    /// Defaults to "register" when omitted.
    pub purpose: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpResponse {
    pub email: String,
    pub expires_in_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub async fn request_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RequestOtpRequest>,
) -> Result<(StatusCode, Json<RequestOtpResponse>), AccountServiceError> {
    let usecase = RequestOtpUseCase {
        verifications: state.verification_repo(),
        accounts: state.account_repo(),
        mailer: state.mailer.clone(),
        limits: state.rate_limits(),
        otp_ttl_secs: state.config.otp_ttl_secs,
        app_name: state.config.app_name.clone(),
        echo_codes: state.config.echo_codes,
    };

    let out = usecase
        .execute(RequestOtpInput {
            email: body.email,
            purpose: parse_purpose(body.purpose.as_deref())?,
            ip: client_ip(&headers),
            user_agent: user_agent(&headers),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestOtpResponse {
            email: out.email,
            expires_in_seconds: out.expires_in_seconds,
            code: out.code,
        }),
    ))
}

// ── POST /auth/otp/verify ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
    pub purpose: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub email: String,
    pub ticket: String,
    pub expires_in_seconds: i64,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AccountServiceError> {
    let usecase = VerifyOtpUseCase {
        verifications: state.verification_repo(),
        ticket_ttl_secs: state.config.ticket_ttl_secs,
    };

    let out = usecase
        .execute(VerifyOtpInput {
            email: body.email,
            purpose: parse_purpose(body.purpose.as_deref())?,
            code: body.code,
        })
        .await?;

    Ok(Json(VerifyOtpResponse {
        email: out.email,
        ticket: out.ticket,
        expires_in_seconds: out.expires_in_seconds,
    }))
}
