use chrono::{DateTime, Utc};
use uuid::Uuid;

use unilink_domain::account::AccountStatus;

use crate::domain::repository::{AccountRepository, Mailer};
use crate::domain::secret::{generate_request_id, issue_numeric, random_hex, token_digest};
use crate::domain::types::{Account, AnonymizedIdentity, DeletionRequest, MAX_REASON_LEN, OTP_LEN};
use crate::email;
use crate::error::AccountServiceError;
use crate::password::hash_password;

fn normalize_reason(reason: Option<&str>) -> Option<String> {
    let trimmed = reason?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_REASON_LEN).collect())
}

/// Replacement identity for an anonymized account. Deterministic prefix plus
/// random suffix: recognizable as a tombstone, not reusable by a real user.
fn build_anonymized_identity(account_id: Uuid) -> Result<AnonymizedIdentity, AccountServiceError> {
    let id_part = account_id.simple().to_string();
    // The stored credential becomes a hash of bytes nobody ever saw, so no
    // cached password can validate again.
    let password_hash = hash_password(&random_hex::<32>())?;
    Ok(AnonymizedIdentity {
        email: format!("deleted+{id_part}.{}@deleted.local", random_hex::<5>()),
        username: format!("deleted_{id_part}_{}", random_hex::<4>()),
        slug: format!("deleted-user-{id_part}-{}", random_hex::<6>()),
        password_hash,
    })
}

fn display_name(account: &Account) -> String {
    account
        .full_name
        .clone()
        .unwrap_or_else(|| account.username.clone())
}

// ── RequestDeletion ──────────────────────────────────────────────────────────

pub struct RequestDeletionInput {
    pub account_id: Uuid,
    pub password: String,
    pub reason: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug)]
pub struct RequestDeletionOutput {
    pub request_id: String,
    pub expires_at: DateTime<Utc>,
    /// Raw OTP, present only when `echo_codes` is enabled.
    pub otp: Option<String>,
}

pub struct RequestDeletionUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub accounts: A,
    pub mailer: M,
    pub delete_otp_ttl_secs: i64,
    pub app_name: String,
    pub echo_codes: bool,
}

impl<A, M> RequestDeletionUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub async fn execute(
        &self,
        input: RequestDeletionInput,
    ) -> Result<RequestDeletionOutput, AccountServiceError> {
        if input.password.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let account = self
            .accounts
            .find_by_id(input.account_id)
            .await?
            .ok_or(AccountServiceError::AccountNotFound)?;

        if account.is_disabled() {
            tracing::info!(account_id = %account.id, "delete.request rejected: already deleted");
            return Err(AccountServiceError::AccountGone);
        }

        if !crate::password::verify_password(&input.password, &account.password_hash)? {
            tracing::info!(account_id = %account.id, "delete.request rejected: bad password");
            return Err(AccountServiceError::InvalidCredentials);
        }

        let now = Utc::now();
        let request_id = generate_request_id();
        let otp = issue_numeric(OTP_LEN, self.delete_otp_ttl_secs, now);
        let reason = normalize_reason(input.reason.as_deref());

        let request = DeletionRequest {
            requested_at: now,
            reason: reason.clone(),
            request_id: request_id.clone(),
            request_ip: input.ip,
            request_ua: input.user_agent,
            otp_digest: otp.digest.clone(),
            otp_expires_at: otp.expires_at,
        };
        self.accounts
            .store_deletion_request(account.id, &request, now)
            .await?;

        let minutes = self.delete_otp_ttl_secs / 60;
        let mail = email::deletion_otp_email(
            &self.app_name,
            &display_name(&account),
            &otp.raw,
            minutes,
            reason.as_deref(),
        );
        if let Err(e) = self
            .mailer
            .send(&account.email, &mail.subject, &mail.html, &mail.text)
            .await
        {
            tracing::error!(account_id = %account.id, error = %e, "delete.request mail dispatch failed");
            // The pending request stays usable, same as a failed OTP delivery.
            return Err(AccountServiceError::DeliveryFailed);
        }

        tracing::info!(
            account_id = %account.id,
            request_id = %request_id,
            expires_at = %otp.expires_at,
            "delete.request created"
        );
        Ok(RequestDeletionOutput {
            request_id,
            expires_at: otp.expires_at,
            otp: self.echo_codes.then_some(otp.raw),
        })
    }
}

// ── ConfirmDeletion ──────────────────────────────────────────────────────────

pub struct ConfirmDeletionInput {
    pub account_id: Uuid,
    pub request_id: String,
    pub otp: String,
}

#[derive(Debug)]
pub struct ConfirmDeletionOutput {
    pub confirmed_at: DateTime<Utc>,
    /// True when the post-commit confirmation email could not be sent.
    /// The deletion itself is not undone by a mailer failure.
    pub mailer_error: bool,
}

pub struct ConfirmDeletionUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub accounts: A,
    pub mailer: M,
    pub app_name: String,
}

impl<A, M> ConfirmDeletionUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub async fn execute(
        &self,
        input: ConfirmDeletionInput,
    ) -> Result<ConfirmDeletionOutput, AccountServiceError> {
        let request_id = input.request_id.trim();
        let otp = input.otp.trim();
        if request_id.is_empty() || otp.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let account = self
            .accounts
            .find_by_id(input.account_id)
            .await?
            .ok_or(AccountServiceError::AccountNotFound)?;

        if account.status == AccountStatus::Deleted {
            return Err(AccountServiceError::AccountGone);
        }

        let Some(pending) = account.deletion.as_ref() else {
            tracing::info!(account_id = %account.id, "delete.confirm rejected: no pending request");
            return Err(AccountServiceError::NoPendingRequest);
        };

        // Request-id and OTP mismatches share one coarse error; the expiry is
        // distinguishable because the request id was already proven valid.
        if pending.request_id != request_id {
            tracing::info!(account_id = %account.id, "delete.confirm rejected: request id mismatch");
            return Err(AccountServiceError::InvalidRequestOrOtp);
        }
        let now = Utc::now();
        if pending.otp_expires_at <= now {
            tracing::info!(account_id = %account.id, request_id = %request_id, "delete.confirm rejected: otp expired");
            return Err(AccountServiceError::OtpExpired);
        }
        if token_digest(otp) != pending.otp_digest {
            tracing::info!(account_id = %account.id, request_id = %request_id, "delete.confirm rejected: bad otp");
            return Err(AccountServiceError::InvalidRequestOrOtp);
        }

        // Captured before the transaction: the row's address is gone after it.
        let original_email = account.email.clone();
        let original_name = display_name(&account);
        let reason = pending.reason.clone();

        let replacement = build_anonymized_identity(account.id)?;
        self.accounts
            .finalize_deletion(
                account.id,
                Some(request_id),
                &replacement,
                reason.as_deref(),
                now,
            )
            .await?;

        let mail = email::deletion_completed_email(&self.app_name, &original_name, now);
        let mailer_error = match self
            .mailer
            .send(&original_email, &mail.subject, &mail.html, &mail.text)
            .await
        {
            Ok(()) => false,
            Err(e) => {
                tracing::error!(account_id = %account.id, error = %e, "delete.confirm completion mail failed");
                true
            }
        };

        tracing::info!(account_id = %account.id, request_id = %request_id, mailer_error, "delete.confirm completed");
        Ok(ConfirmDeletionOutput {
            confirmed_at: now,
            mailer_error,
        })
    }
}

// ── AdminDelete ──────────────────────────────────────────────────────────────

pub struct AdminDeleteInput {
    pub account_id: Uuid,
    pub admin_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug)]
pub struct AdminDeleteOutput {
    pub account_id: Uuid,
    pub confirmed_at: DateTime<Utc>,
    pub mailer_error: bool,
}

pub struct AdminDeleteUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub accounts: A,
    pub mailer: M,
    pub app_name: String,
}

impl<A, M> AdminDeleteUseCase<A, M>
where
    A: AccountRepository,
    M: Mailer,
{
    pub async fn execute(
        &self,
        input: AdminDeleteInput,
    ) -> Result<AdminDeleteOutput, AccountServiceError> {
        let account = self
            .accounts
            .find_by_id(input.account_id)
            .await?
            .ok_or(AccountServiceError::AccountNotFound)?;

        if account.status == AccountStatus::Deleted {
            return Err(AccountServiceError::AccountGone);
        }

        let reason = normalize_reason(input.reason.as_deref())
            .or_else(|| {
                account
                    .deletion
                    .as_ref()
                    .and_then(|pending| pending.reason.clone())
            })
            .unwrap_or_else(|| format!("deleted by admin:{}", input.admin_id));

        let original_email = account.email.clone();
        let original_name = display_name(&account);
        let now = Utc::now();

        // No OTP gate: the caller's elevated role was checked at the route.
        let replacement = build_anonymized_identity(account.id)?;
        self.accounts
            .finalize_deletion(account.id, None, &replacement, Some(&reason), now)
            .await?;

        let mail = email::deletion_completed_email(&self.app_name, &original_name, now);
        let mailer_error = match self
            .mailer
            .send(&original_email, &mail.subject, &mail.html, &mail.text)
            .await
        {
            Ok(()) => false,
            Err(e) => {
                tracing::error!(account_id = %account.id, error = %e, "delete.admin completion mail failed");
                true
            }
        };

        tracing::info!(
            account_id = %account.id,
            admin_id = %input.admin_id,
            mailer_error,
            "delete.admin completed"
        );
        Ok(AdminDeleteOutput {
            account_id: account.id,
            confirmed_at: now,
            mailer_error,
        })
    }
}
