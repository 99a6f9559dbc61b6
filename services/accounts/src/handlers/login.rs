use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccountServiceError;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};

// ── POST /auth/login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Email or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_expires_at: u64,
    pub account_id: Uuid,
    pub username: String,
    pub email: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AccountServiceError> {
    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        limiter: state.login_limiter.clone(),
        jwt_secret: state.config.jwt_secret.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            identifier: body.identifier,
            password: body.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: out.token,
        token_expires_at: out.token_expires_at,
        account_id: out.account_id,
        username: out.username,
        email: out.email,
    }))
}
