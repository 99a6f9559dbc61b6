use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::domain::repository::AccountRepository;
use crate::domain::types::{Account, SESSION_TTL_SECS};
use crate::error::AccountServiceError;

/// Session token claims. `epoch` must match the account's current
/// `session_epoch` at verification time; bumping the column therefore
/// invalidates every previously issued token at once.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub epoch: i32,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

pub fn issue_session_token(
    account: &Account,
    secret: &str,
) -> Result<(String, u64), AccountServiceError> {
    let exp = now_secs() + SESSION_TTL_SECS;
    let claims = SessionClaims {
        sub: account.id.to_string(),
        epoch: account.session_epoch,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AccountServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

/// Validate signature and expiry and return the claims. Epoch comparison
/// against the stored account happens in [`CheckTokenUseCase`].
pub fn decode_session_token(token: &str, secret: &str) -> Result<SessionClaims, AccountServiceError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AccountServiceError::InvalidToken)?;

    Ok(data.claims)
}

// ── CheckToken ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CheckTokenOutput {
    pub account_id: Uuid,
    pub role: i16,
}

pub struct CheckTokenUseCase<A: AccountRepository> {
    pub accounts: A,
    pub jwt_secret: String,
}

impl<A: AccountRepository> CheckTokenUseCase<A> {
    pub async fn execute(&self, token: &str) -> Result<CheckTokenOutput, AccountServiceError> {
        let claims = decode_session_token(token, &self.jwt_secret)?;

        let account_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AccountServiceError::InvalidToken)?;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AccountServiceError::InvalidToken)?;

        // A stale epoch means the token predates a deletion or forced logout.
        if account.session_epoch != claims.epoch || account.is_disabled() {
            return Err(AccountServiceError::InvalidToken);
        }

        Ok(CheckTokenOutput {
            account_id: account.id,
            role: account.role,
        })
    }
}
