use chrono::{Duration, Utc};
use uuid::Uuid;

use unilink_domain::account::Purpose;
use unilink_domain::validate::{normalize_email, validate_email};

use crate::domain::repository::{AccountRepository, Mailer, VerificationRepository};
use crate::domain::secret::{generate_numeric_code, issue_numeric};
use crate::domain::types::{OTP_LEN, TICKET_LEN, VerificationCode};
use crate::email;
use crate::error::AccountServiceError;
use crate::usecase::ratelimit::{self, RateLimitConfig, RateScope, WINDOW_SECS};

// ── RequestOtp ───────────────────────────────────────────────────────────────

pub struct RequestOtpInput {
    pub email: String,
    pub purpose: Purpose,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug)]
pub struct RequestOtpOutput {
    pub email: String,
    pub expires_in_seconds: i64,
    /// Raw code, present only when `echo_codes` is enabled.
    pub code: Option<String>,
}

pub struct RequestOtpUseCase<V, A, M>
where
    V: VerificationRepository,
    A: AccountRepository,
    M: Mailer,
{
    pub verifications: V,
    pub accounts: A,
    pub mailer: M,
    pub limits: RateLimitConfig,
    pub otp_ttl_secs: i64,
    pub app_name: String,
    pub echo_codes: bool,
}

impl<V, A, M> RequestOtpUseCase<V, A, M>
where
    V: VerificationRepository,
    A: AccountRepository,
    M: Mailer,
{
    pub async fn execute(
        &self,
        input: RequestOtpInput,
    ) -> Result<RequestOtpOutput, AccountServiceError> {
        let email = normalize_email(&input.email);
        if !validate_email(&email) {
            return Err(AccountServiceError::InvalidEmail);
        }

        // "Already registered" is terminal for the register purpose; it is
        // checked before the rate gates so it is never reported as 429.
        if input.purpose == Purpose::Register && self.accounts.email_exists(&email).await? {
            tracing::info!(email = %email, "otp.request blocked: already registered");
            return Err(AccountServiceError::AlreadyRegistered);
        }

        let now = Utc::now();
        let stats = self
            .verifications
            .request_stats(
                &email,
                input.ip.as_deref(),
                input.purpose,
                now - Duration::seconds(WINDOW_SECS),
            )
            .await?;
        if let Err(rejection) = ratelimit::evaluate(&stats, &self.limits, now) {
            let scope = match rejection.scope {
                RateScope::Email => "email",
                RateScope::Ip => "ip",
                RateScope::Cooldown => "cooldown",
            };
            tracing::info!(
                email = %email,
                scope,
                retry_after = rejection.retry_after_secs,
                "otp.request rate limited"
            );
            return Err(AccountServiceError::RateLimited {
                retry_after_secs: rejection.retry_after_secs,
            });
        }

        // At most one active code per (email, purpose).
        self.verifications
            .invalidate_active(&email, input.purpose)
            .await?;

        let code = generate_numeric_code(OTP_LEN);
        let record = VerificationCode {
            id: Uuid::new_v4(),
            email: email.clone(),
            purpose: input.purpose,
            code: code.clone(),
            expires_at: now + Duration::seconds(self.otp_ttl_secs),
            consumed: false,
            verified_at: None,
            attempts: 0,
            created_ip: input.ip,
            created_ua: input.user_agent,
            ticket_digest: None,
            ticket_expires_at: None,
            ticket_consumed_at: None,
            created_at: now,
        };
        self.verifications.create(&record).await?;

        // The record is committed before dispatch: a failing mailer must not
        // invalidate the code, so a later verify with the mailed code (e.g.
        // from a retried delivery) still succeeds.
        let mail = email::otp_email(&self.app_name, &code, self.otp_ttl_secs / 60);
        if let Err(e) = self
            .mailer
            .send(&email, &mail.subject, &mail.html, &mail.text)
            .await
        {
            tracing::error!(email = %email, error = %e, "otp.request mail dispatch failed");
            return Err(AccountServiceError::DeliveryFailed);
        }

        tracing::info!(email = %email, purpose = ?input.purpose, ttl = self.otp_ttl_secs, "otp.request created");
        Ok(RequestOtpOutput {
            email,
            expires_in_seconds: self.otp_ttl_secs,
            code: self.echo_codes.then_some(code),
        })
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

pub struct VerifyOtpInput {
    pub email: String,
    pub purpose: Purpose,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub email: String,
    /// Raw single-use ticket; never persisted or logged.
    pub ticket: String,
    pub expires_in_seconds: i64,
}

pub struct VerifyOtpUseCase<V: VerificationRepository> {
    pub verifications: V,
    pub ticket_ttl_secs: i64,
}

impl<V: VerificationRepository> VerifyOtpUseCase<V> {
    pub async fn execute(
        &self,
        input: VerifyOtpInput,
    ) -> Result<VerifyOtpOutput, AccountServiceError> {
        let email = normalize_email(&input.email);
        let code = input.code.trim();
        if email.is_empty() || code.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let record = self
            .verifications
            .find_latest_unconsumed(&email, input.purpose)
            .await?
            .ok_or(AccountServiceError::NoActiveCode)?;

        let now = Utc::now();
        if record.is_expired(now) {
            // An expired code must never become valid again.
            self.verifications.mark_consumed(record.id).await?;
            return Err(AccountServiceError::CodeExpired);
        }

        if record.code != code {
            self.verifications.record_failed_attempt(record.id).await?;
            return Err(AccountServiceError::InvalidCode);
        }

        let ticket = issue_numeric(TICKET_LEN, self.ticket_ttl_secs, now);
        self.verifications
            .store_ticket(record.id, &ticket.digest, now, ticket.expires_at)
            .await?;

        tracing::info!(email = %email, purpose = ?input.purpose, "otp.verify succeeded");
        Ok(VerifyOtpOutput {
            email,
            ticket: ticket.raw,
            expires_in_seconds: self.ticket_ttl_secs,
        })
    }
}
