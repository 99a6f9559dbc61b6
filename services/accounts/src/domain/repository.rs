#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use unilink_domain::account::Purpose;

use crate::domain::types::{
    Account, AnonymizedIdentity, DeletionRequest, NewAccount, VerificationCode,
};
use crate::error::AccountServiceError;

/// Snapshot of recent OTP request activity for one (email, ip) pair, read from
/// the durable verification ledger so the rate gates survive restarts.
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    /// Requests for this email inside the trailing window.
    pub email_count: u64,
    /// Oldest request for this email inside the window.
    pub oldest_email_at: Option<DateTime<Utc>>,
    /// Most recent request for this email, windowed or not.
    pub last_email_at: Option<DateTime<Utc>>,
    /// Requests from this IP inside the trailing window (0 when IP unknown).
    pub ip_count: u64,
    /// Oldest request from this IP inside the window.
    pub oldest_ip_at: Option<DateTime<Utc>>,
    /// Most recent request from this IP, windowed or not.
    pub last_ip_at: Option<DateTime<Utc>>,
}

/// Repository for the OTP/ticket verification ledger.
pub trait VerificationRepository: Send + Sync {
    /// Read request-rate statistics for the rate gates (§ rate limiting).
    async fn request_stats(
        &self,
        email: &str,
        ip: Option<&str>,
        purpose: Purpose,
        window_start: DateTime<Utc>,
    ) -> Result<RequestStats, AccountServiceError>;

    /// Mark every unconsumed record for (email, purpose) consumed.
    /// Returns the number of records invalidated.
    async fn invalidate_active(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<u64, AccountServiceError>;

    /// Persist a freshly issued code.
    async fn create(&self, record: &VerificationCode) -> Result<(), AccountServiceError>;

    /// Most recent unconsumed record for (email, purpose), if any.
    async fn find_latest_unconsumed(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<Option<VerificationCode>, AccountServiceError>;

    /// Mark a record consumed without verifying it (expired-code path).
    async fn mark_consumed(&self, id: Uuid) -> Result<(), AccountServiceError>;

    /// Bump the attempt counter after a wrong code.
    async fn record_failed_attempt(&self, id: Uuid) -> Result<(), AccountServiceError>;

    /// Consume the code and attach the derived ticket digest in one update.
    async fn store_ticket(
        &self,
        id: Uuid,
        ticket_digest: &str,
        verified_at: DateTime<Utc>,
        ticket_expires_at: DateTime<Utc>,
    ) -> Result<(), AccountServiceError>;
}

/// Repository for account rows and their deletion lifecycle.
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountServiceError>;

    /// Login lookup: the identifier may be an email or a username.
    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountServiceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AccountServiceError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AccountServiceError>;

    async fn student_no_exists(&self, student_no: &str) -> Result<bool, AccountServiceError>;

    async fn employee_no_exists(&self, employee_no: &str) -> Result<bool, AccountServiceError>;

    /// Atomically consume a registration ticket and create the account in the
    /// same transaction. The guarded ticket update is the only synchronization
    /// point: exactly one concurrent caller can succeed per ticket. Zero rows
    /// affected maps to `TicketInvalid` / `TicketUsed` / `TicketExpired` via a
    /// diagnostic read that never influences state.
    async fn create_with_ticket(
        &self,
        account: &NewAccount,
        purpose: Purpose,
        ticket_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError>;

    /// Store a pending deletion request and move status to `delete_requested`.
    async fn store_deletion_request(
        &self,
        account_id: Uuid,
        request: &DeletionRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError>;

    /// Run the anonymizing transaction: archive a snapshot of the row, then a
    /// guarded update that replaces identity, nulls PII, clears the pending
    /// block, disables login, and bumps the session epoch. When
    /// `expected_request_id` is set the guard additionally requires
    /// `status = delete_requested` with that request id (self-service confirm);
    /// without it only `status != deleted` is required (admin override).
    /// Zero rows affected rolls the archive back and maps to `AccountGone` or
    /// `NoPendingRequest`.
    async fn finalize_deletion(
        &self,
        account_id: Uuid,
        expected_request_id: Option<&str>,
        replacement: &AnonymizedIdentity,
        reason: Option<&str>,
        confirmed_at: DateTime<Utc>,
    ) -> Result<(), AccountServiceError>;
}

/// Port for outbound transactional email. Implementations must be callable
/// independently of any open database transaction.
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), anyhow::Error>;
}
