use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use unilink_auth_types::identity::IdentityHeaders;

use crate::error::AccountServiceError;
use crate::state::AppState;
use crate::usecase::deletion::{AdminDeleteInput, AdminDeleteUseCase};

/// Minimum role for administrative account deletion (0 member, 1 moderator,
/// 2 admin).
const ROLE_ADMIN: u8 = 2;

// ── DELETE /admin/accounts/{account_id} ───────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct AdminDeleteRequest {
    pub reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDeleteResponse {
    pub account_id: Uuid,
    pub status: &'static str,
    #[serde(serialize_with = "unilink_core::serde::to_rfc3339_ms")]
    pub confirmed_at: DateTime<Utc>,
    pub mailer_error: bool,
}

/// Moderation override: anonymizes the account with no OTP challenge. The
/// elevated role is the entire trust boundary here.
pub async fn admin_delete(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path(account_id): Path<Uuid>,
    body: Option<Json<AdminDeleteRequest>>,
) -> Result<Json<AdminDeleteResponse>, AccountServiceError> {
    if identity.account_role < ROLE_ADMIN {
        return Err(AccountServiceError::Forbidden);
    }

    let usecase = AdminDeleteUseCase {
        accounts: state.account_repo(),
        mailer: state.mailer.clone(),
        app_name: state.config.app_name.clone(),
    };

    let out = usecase
        .execute(AdminDeleteInput {
            account_id,
            admin_id: identity.account_id,
            reason: body.map(|Json(b)| b.reason).unwrap_or_default(),
        })
        .await?;

    Ok(Json(AdminDeleteResponse {
        account_id: out.account_id,
        status: "deleted",
        confirmed_at: out.confirmed_at,
        mailer_error: out.mailer_error,
    }))
}
