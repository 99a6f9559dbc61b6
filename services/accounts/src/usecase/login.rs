use std::sync::Arc;

use uuid::Uuid;

use crate::domain::repository::AccountRepository;
use crate::error::AccountServiceError;
use crate::limiter::LoginLimiter;
use crate::password::verify_password;
use crate::usecase::token::issue_session_token;

pub struct LoginInput {
    /// Email or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub token: String,
    pub token_expires_at: u64,
    pub account_id: Uuid,
    pub username: String,
    pub email: String,
}

pub struct LoginUseCase<A: AccountRepository> {
    pub accounts: A,
    pub limiter: Arc<LoginLimiter>,
    pub jwt_secret: String,
}

impl<A: AccountRepository> LoginUseCase<A> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, AccountServiceError> {
        let identifier = input.identifier.trim();
        if identifier.is_empty() || input.password.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let account = self
            .accounts
            .find_by_email_or_username(identifier)
            .await?
            // Unknown account and wrong password must be indistinguishable.
            .ok_or(AccountServiceError::InvalidCredentials)?;

        if account.is_disabled() {
            tracing::info!(account_id = %account.id, status = ?account.status, "login rejected: disabled");
            return Err(AccountServiceError::AccountDisabled);
        }

        // Locked accounts are rejected before any password check runs.
        if let Some(retry_after_secs) = self.limiter.is_locked(account.id) {
            tracing::info!(account_id = %account.id, retry_after_secs, "login rejected: locked");
            return Err(AccountServiceError::RateLimited { retry_after_secs });
        }

        if !verify_password(&input.password, &account.password_hash)? {
            let outcome = self.limiter.record_failure(account.id);
            tracing::info!(
                account_id = %account.id,
                failures = outcome.count,
                just_locked = outcome.just_locked,
                "login failed: bad password"
            );
            if outcome.just_locked {
                return Err(AccountServiceError::RateLimited {
                    retry_after_secs: outcome.retry_after_secs,
                });
            }
            return Err(AccountServiceError::InvalidCredentials);
        }

        self.limiter.clear(account.id);

        let (token, token_expires_at) = issue_session_token(&account, &self.jwt_secret)?;
        tracing::info!(account_id = %account.id, "login succeeded");
        Ok(LoginOutput {
            token,
            token_expires_at,
            account_id: account.id,
            username: account.username,
            email: account.email,
        })
    }
}
