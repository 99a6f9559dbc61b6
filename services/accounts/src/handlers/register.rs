use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccountServiceError;
use crate::state::AppState;
use crate::usecase::register::{RegisterInput, RegisterUseCase};

// ── POST /auth/register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub ticket: String,
    pub gender: Option<String>,
    pub student_no: Option<String>,
    pub employee_no: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AccountServiceError> {
    let usecase = RegisterUseCase {
        accounts: state.account_repo(),
    };

    let out = usecase
        .execute(RegisterInput {
            full_name: body.full_name,
            username: body.username,
            email: body.email,
            password: body.password,
            ticket: body.ticket,
            gender: body.gender,
            student_no: body.student_no,
            employee_no: body.employee_no,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: out.id,
            full_name: out.full_name,
            username: out.username,
            email: out.email,
        }),
    ))
}
