use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AccountServiceError;
use crate::state::AppState;
use crate::usecase::token::CheckTokenUseCase;

fn bearer_token(headers: &HeaderMap) -> Result<&str, AccountServiceError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AccountServiceError::InvalidToken)
}

// ── GET /auth/token ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTokenResponse {
    pub account_id: Uuid,
    pub role: i16,
}

/// Called by the gateway to validate a session token before it injects the
/// identity headers for downstream services.
pub async fn check_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckTokenResponse>, AccountServiceError> {
    let token = bearer_token(&headers)?;

    let usecase = CheckTokenUseCase {
        accounts: state.account_repo(),
        jwt_secret: state.config.jwt_secret.clone(),
    };

    let out = usecase.execute(token).await?;

    Ok(Json(CheckTokenResponse {
        account_id: out.account_id,
        role: out.role,
    }))
}
