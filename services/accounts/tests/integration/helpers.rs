use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use unilink_accounts::domain::repository::{
    AccountRepository, Mailer, RequestStats, VerificationRepository,
};
use unilink_accounts::domain::secret::token_digest;
use unilink_accounts::domain::types::{
    Account, AnonymizedIdentity, DeletionRequest, NewAccount, VerificationCode,
};
use unilink_accounts::error::AccountServiceError;
use unilink_accounts::password::hash_password;
use unilink_accounts::usecase::ratelimit::RateLimitConfig;
use unilink_domain::account::{AccountStatus, Purpose};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

// ── MockVerificationRepo ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockVerificationRepo {
    pub codes: Arc<Mutex<Vec<VerificationCode>>>,
}

impl MockVerificationRepo {
    pub fn new(codes: Vec<VerificationCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Shared handle to the stored codes for post-execution inspection.
    pub fn codes_handle(&self) -> Arc<Mutex<Vec<VerificationCode>>> {
        Arc::clone(&self.codes)
    }
}

impl VerificationRepository for MockVerificationRepo {
    async fn request_stats(
        &self,
        email: &str,
        ip: Option<&str>,
        purpose: Purpose,
        window_start: DateTime<Utc>,
    ) -> Result<RequestStats, AccountServiceError> {
        let codes = self.codes.lock().unwrap();

        let by_email: Vec<_> = codes
            .iter()
            .filter(|c| c.email == email && c.purpose == purpose)
            .collect();
        let in_window: Vec<_> = by_email
            .iter()
            .filter(|c| c.created_at > window_start)
            .collect();

        let mut stats = RequestStats {
            email_count: in_window.len() as u64,
            oldest_email_at: in_window.iter().map(|c| c.created_at).min(),
            last_email_at: by_email.iter().map(|c| c.created_at).max(),
            ..Default::default()
        };

        if let Some(ip) = ip {
            let by_ip: Vec<_> = codes
                .iter()
                .filter(|c| c.created_ip.as_deref() == Some(ip) && c.purpose == purpose)
                .collect();
            let in_window: Vec<_> = by_ip
                .iter()
                .filter(|c| c.created_at > window_start)
                .collect();
            stats.ip_count = in_window.len() as u64;
            stats.oldest_ip_at = in_window.iter().map(|c| c.created_at).min();
            stats.last_ip_at = by_ip.iter().map(|c| c.created_at).max();
        }

        Ok(stats)
    }

    async fn invalidate_active(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<u64, AccountServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let mut invalidated = 0;
        for code in codes
            .iter_mut()
            .filter(|c| c.email == email && c.purpose == purpose && !c.consumed)
        {
            code.consumed = true;
            invalidated += 1;
        }
        Ok(invalidated)
    }

    async fn create(&self, record: &VerificationCode) -> Result<(), AccountServiceError> {
        self.codes.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_latest_unconsumed(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<Option<VerificationCode>, AccountServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.email == email && c.purpose == purpose && !c.consumed)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn mark_consumed(&self, id: Uuid) -> Result<(), AccountServiceError> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(code) = codes.iter_mut().find(|c| c.id == id) {
            code.consumed = true;
        }
        Ok(())
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<(), AccountServiceError> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(code) = codes.iter_mut().find(|c| c.id == id) {
            code.attempts += 1;
        }
        Ok(())
    }

    async fn store_ticket(
        &self,
        id: Uuid,
        ticket_digest: &str,
        verified_at: DateTime<Utc>,
        ticket_expires_at: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(code) = codes.iter_mut().find(|c| c.id == id) {
            code.consumed = true;
            code.verified_at = Some(verified_at);
            code.ticket_digest = Some(ticket_digest.to_owned());
            code.ticket_expires_at = Some(ticket_expires_at);
            code.ticket_consumed_at = None;
        }
        Ok(())
    }
}

// ── MockAccountRepo ──────────────────────────────────────────────────────────

/// Pre-anonymization snapshot captured by the mock's deletion transaction.
#[derive(Debug, Clone)]
pub struct ArchivedAccount {
    pub snapshot: Account,
    pub reason: Option<String>,
}

/// Accounts plus the verification codes it consumes tickets against. The
/// shared mutex plays the role of the database's serialization: the guarded
/// mutations below are evaluated atomically, so concurrent callers observe
/// exactly-once semantics just like the conditional UPDATEs they stand in for.
#[derive(Clone)]
pub struct MockAccountRepo {
    pub accounts: Arc<Mutex<Vec<Account>>>,
    pub codes: Arc<Mutex<Vec<VerificationCode>>>,
    pub archives: Arc<Mutex<Vec<ArchivedAccount>>>,
}

impl MockAccountRepo {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(accounts)),
            codes: Arc::new(Mutex::new(vec![])),
            archives: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Share a verification-code store with a [`MockVerificationRepo`] so a
    /// ticket issued through one is consumable through the other.
    pub fn with_codes(mut self, codes: Arc<Mutex<Vec<VerificationCode>>>) -> Self {
        self.codes = codes;
        self
    }

    pub fn accounts_handle(&self) -> Arc<Mutex<Vec<Account>>> {
        Arc::clone(&self.accounts)
    }

    pub fn archives_handle(&self) -> Arc<Mutex<Vec<ArchivedAccount>>> {
        Arc::clone(&self.archives)
    }
}

impl AccountRepository for MockAccountRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountServiceError> {
        let email = identifier.trim().to_lowercase();
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == identifier || (identifier.contains('@') && a.email == email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AccountServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AccountServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.username == username))
    }

    async fn student_no_exists(&self, student_no: &str) -> Result<bool, AccountServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.student_no.as_deref() == Some(student_no)))
    }

    async fn employee_no_exists(&self, employee_no: &str) -> Result<bool, AccountServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.employee_no.as_deref() == Some(employee_no)))
    }

    async fn create_with_ticket(
        &self,
        account: &NewAccount,
        purpose: Purpose,
        ticket_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        // One lock across consume + insert mirrors the single transaction.
        let mut codes = self.codes.lock().unwrap();

        let matching = codes
            .iter_mut()
            .find(|c| {
                c.email == account.email
                    && c.purpose == purpose
                    && c.ticket_digest.as_deref() == Some(ticket_digest)
            });

        match matching {
            Some(code)
                if code.consumed
                    && code.ticket_consumed_at.is_none()
                    && code.ticket_expires_at.is_some_and(|t| t > now) =>
            {
                code.ticket_consumed_at = Some(now);
            }
            None => return Err(AccountServiceError::TicketInvalid),
            Some(code) if code.ticket_consumed_at.is_some() => {
                return Err(AccountServiceError::TicketUsed);
            }
            Some(code) if !code.consumed => return Err(AccountServiceError::TicketInvalid),
            Some(code) if code.ticket_expires_at.is_none_or(|t| t <= now) => {
                return Err(AccountServiceError::TicketExpired);
            }
            Some(_) => return Err(AccountServiceError::TicketInvalid),
        }

        self.accounts.lock().unwrap().push(Account {
            id: account.id,
            email: account.email.clone(),
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            status: AccountStatus::Active,
            login_disabled: false,
            session_epoch: 0,
            full_name: Some(account.full_name.clone()),
            bio: None,
            gender: account.gender.clone(),
            student_no: account.student_no.clone(),
            employee_no: account.employee_no.clone(),
            avatar_url: None,
            deletion: None,
            anonymized_slug: None,
            sanitized_at: None,
            created_at: account.created_at,
            updated_at: account.created_at,
        });
        Ok(())
    }

    async fn store_deletion_request(
        &self,
        account_id: Uuid,
        request: &DeletionRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(AccountServiceError::AccountNotFound)?;
        account.status = AccountStatus::DeleteRequested;
        account.deletion = Some(request.clone());
        account.updated_at = now;
        Ok(())
    }

    async fn finalize_deletion(
        &self,
        account_id: Uuid,
        expected_request_id: Option<&str>,
        replacement: &AnonymizedIdentity,
        reason: Option<&str>,
        confirmed_at: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(AccountServiceError::AccountNotFound)?;

        // Same guard as the conditional UPDATE: a miss leaves the row alone.
        if account.status == AccountStatus::Deleted {
            return Err(AccountServiceError::AccountGone);
        }
        if let Some(request_id) = expected_request_id {
            let pending = account
                .deletion
                .as_ref()
                .filter(|_| account.status == AccountStatus::DeleteRequested);
            if pending.map(|p| p.request_id.as_str()) != Some(request_id) {
                return Err(AccountServiceError::NoPendingRequest);
            }
        }

        self.archives.lock().unwrap().push(ArchivedAccount {
            snapshot: account.clone(),
            reason: reason.map(str::to_owned),
        });

        account.email = replacement.email.clone();
        account.username = replacement.username.clone();
        account.password_hash = replacement.password_hash.clone();
        account.status = AccountStatus::Deleted;
        account.login_disabled = true;
        account.full_name = None;
        account.bio = None;
        account.gender = None;
        account.student_no = None;
        account.employee_no = None;
        account.avatar_url = None;
        account.deletion = None;
        account.anonymized_slug = Some(replacement.slug.clone());
        account.sanitized_at = Some(confirmed_at);
        account.session_epoch += 1;
        account.updated_at = confirmed_at;
        Ok(())
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
}

#[derive(Clone)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    fail: Arc<AtomicBool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        let mailer = Self::new();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<SentMail>>> {
        Arc::clone(&self.sent)
    }
}

impl Mailer for MockMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _html: &str,
        _text: &str,
    ) -> Result<(), anyhow::Error> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mail provider returned 500: simulated outage");
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_owned(),
            subject: subject.to_owned(),
        });
        Ok(())
    }
}

// ── Test fixtures ────────────────────────────────────────────────────────────

pub fn test_limits() -> RateLimitConfig {
    RateLimitConfig::default()
}

pub fn test_account(email: &str, username: &str) -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::now_v7(),
        email: email.to_owned(),
        username: username.to_owned(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role: 0,
        status: AccountStatus::Active,
        login_disabled: false,
        session_epoch: 0,
        full_name: Some("Alice Doe".to_owned()),
        bio: Some("hi".to_owned()),
        gender: Some("female".to_owned()),
        student_no: Some("S-1001".to_owned()),
        employee_no: None,
        avatar_url: Some("https://cdn.example/avatar.png".to_owned()),
        deletion: None,
        anonymized_slug: None,
        sanitized_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_code(email: &str, code: &str) -> VerificationCode {
    let now = Utc::now();
    VerificationCode {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        purpose: Purpose::Register,
        code: code.to_owned(),
        expires_at: now + Duration::seconds(300),
        consumed: false,
        verified_at: None,
        attempts: 0,
        created_ip: Some("203.0.113.7".to_owned()),
        created_ua: Some("integration-test".to_owned()),
        ticket_digest: None,
        ticket_expires_at: None,
        ticket_consumed_at: None,
        created_at: now,
    }
}

/// A record in the post-verification state: code spent, ticket outstanding.
pub fn verified_code_with_ticket(email: &str, raw_ticket: &str) -> VerificationCode {
    let now = Utc::now();
    VerificationCode {
        consumed: true,
        verified_at: Some(now),
        ticket_digest: Some(token_digest(raw_ticket)),
        ticket_expires_at: Some(now + Duration::seconds(1800)),
        ..test_code(email, "1234")
    }
}

pub fn pending_deletion(request_id: &str, otp: &str) -> DeletionRequest {
    let now = Utc::now();
    DeletionRequest {
        requested_at: now,
        reason: Some("moving on".to_owned()),
        request_id: request_id.to_owned(),
        request_ip: Some("203.0.113.7".to_owned()),
        request_ua: Some("integration-test".to_owned()),
        otp_digest: token_digest(otp),
        otp_expires_at: now + Duration::seconds(900),
    }
}
