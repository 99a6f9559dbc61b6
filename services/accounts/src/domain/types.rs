use chrono::{DateTime, Utc};
use uuid::Uuid;

use unilink_domain::account::{AccountStatus, Purpose};

/// Registration OTP code length in digits.
pub const OTP_LEN: usize = 4;

/// Registration ticket length in digits.
pub const TICKET_LEN: usize = 10;

/// Session token lifetime in seconds (7 days).
pub const SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Free-text deletion reasons are capped at this many characters.
pub const MAX_REASON_LEN: usize = 2000;

/// One OTP issuance for a (email, purpose) pair, including the derived
/// registration ticket once the code has been verified.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub email: String,
    pub purpose: Purpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub attempts: i16,
    pub created_ip: Option<String>,
    pub created_ua: Option<String>,
    pub ticket_digest: Option<String>,
    pub ticket_expires_at: Option<DateTime<Utc>>,
    pub ticket_consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Pending deletion state carried on an account while `status = delete_requested`.
/// All fields are stored and cleared together.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub requested_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub request_id: String,
    pub request_ip: Option<String>,
    pub request_ua: Option<String>,
    pub otp_digest: String,
    pub otp_expires_at: DateTime<Utc>,
}

/// Full account as the use cases see it.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: i16,
    pub status: AccountStatus,
    pub login_disabled: bool,
    pub session_epoch: i32,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub student_no: Option<String>,
    pub employee_no: Option<String>,
    pub avatar_url: Option<String>,
    /// Present exactly while `status == DeleteRequested`.
    pub deletion: Option<DeletionRequest>,
    pub anonymized_slug: Option<String>,
    pub sanitized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// An account that can no longer authenticate or be acted on by its owner.
    pub fn is_disabled(&self) -> bool {
        self.login_disabled || self.status == AccountStatus::Deleted
    }
}

/// Fields for a new account row created at registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: i16,
    pub full_name: String,
    pub gender: Option<String>,
    pub student_no: Option<String>,
    pub employee_no: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Replacement identity written over an account row during anonymization.
/// None of these values are derivable from the original identity.
#[derive(Debug, Clone)]
pub struct AnonymizedIdentity {
    pub email: String,
    pub username: String,
    pub slug: String,
    pub password_hash: String,
}
