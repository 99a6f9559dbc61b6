use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionError,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use unilink_accounts_schema::{account_delete_archives, accounts, verification_codes};
use unilink_domain::account::{AccountStatus, Purpose};
use unilink_domain::validate::normalize_email;

use crate::domain::repository::{AccountRepository, RequestStats, VerificationRepository};
use crate::domain::types::{
    Account, AnonymizedIdentity, DeletionRequest, NewAccount, VerificationCode,
};
use crate::error::AccountServiceError;

fn tx_error(e: TransactionError<AccountServiceError>) -> AccountServiceError {
    match e {
        TransactionError::Connection(db) => {
            AccountServiceError::Internal(anyhow::Error::new(db).context("transaction"))
        }
        TransactionError::Transaction(err) => err,
    }
}

// ── Verification repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationRepository {
    pub db: DatabaseConnection,
}

impl VerificationRepository for DbVerificationRepository {
    async fn request_stats(
        &self,
        email: &str,
        ip: Option<&str>,
        purpose: Purpose,
        window_start: DateTime<Utc>,
    ) -> Result<RequestStats, AccountServiceError> {
        let by_email = || {
            verification_codes::Entity::find()
                .filter(verification_codes::Column::Email.eq(email))
                .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
        };

        let email_count = by_email()
            .filter(verification_codes::Column::CreatedAt.gt(window_start))
            .count(&self.db)
            .await
            .context("count email requests in window")?;
        let oldest_email_at = by_email()
            .filter(verification_codes::Column::CreatedAt.gt(window_start))
            .order_by_asc(verification_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("oldest email request in window")?
            .map(|m| m.created_at);
        let last_email_at = by_email()
            .order_by_desc(verification_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("latest email request")?
            .map(|m| m.created_at);

        let mut stats = RequestStats {
            email_count,
            oldest_email_at,
            last_email_at,
            ..Default::default()
        };

        if let Some(ip) = ip {
            let by_ip = || {
                verification_codes::Entity::find()
                    .filter(verification_codes::Column::CreatedIp.eq(ip))
                    .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            };
            stats.ip_count = by_ip()
                .filter(verification_codes::Column::CreatedAt.gt(window_start))
                .count(&self.db)
                .await
                .context("count ip requests in window")?;
            stats.oldest_ip_at = by_ip()
                .filter(verification_codes::Column::CreatedAt.gt(window_start))
                .order_by_asc(verification_codes::Column::CreatedAt)
                .one(&self.db)
                .await
                .context("oldest ip request in window")?
                .map(|m| m.created_at);
            stats.last_ip_at = by_ip()
                .order_by_desc(verification_codes::Column::CreatedAt)
                .one(&self.db)
                .await
                .context("latest ip request")?
                .map(|m| m.created_at);
        }

        Ok(stats)
    }

    async fn invalidate_active(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<u64, AccountServiceError> {
        let result = verification_codes::Entity::update_many()
            .col_expr(verification_codes::Column::Consumed, Expr::value(true))
            .filter(verification_codes::Column::Email.eq(email))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(verification_codes::Column::Consumed.eq(false))
            .exec(&self.db)
            .await
            .context("invalidate active codes")?;
        Ok(result.rows_affected)
    }

    async fn create(&self, record: &VerificationCode) -> Result<(), AccountServiceError> {
        verification_codes::ActiveModel {
            id: Set(record.id),
            email: Set(record.email.clone()),
            purpose: Set(record.purpose.as_str().to_owned()),
            code: Set(record.code.clone()),
            expires_at: Set(record.expires_at),
            consumed: Set(record.consumed),
            verified_at: Set(record.verified_at),
            attempts: Set(record.attempts),
            created_ip: Set(record.created_ip.clone()),
            created_ua: Set(record.created_ua.clone()),
            ticket_digest: Set(record.ticket_digest.clone()),
            ticket_expires_at: Set(record.ticket_expires_at),
            ticket_consumed_at: Set(record.ticket_consumed_at),
            created_at: Set(record.created_at),
        }
        .insert(&self.db)
        .await
        .context("create verification code")?;
        Ok(())
    }

    async fn find_latest_unconsumed(
        &self,
        email: &str,
        purpose: Purpose,
    ) -> Result<Option<VerificationCode>, AccountServiceError> {
        let model = verification_codes::Entity::find()
            .filter(verification_codes::Column::Email.eq(email))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(verification_codes::Column::Consumed.eq(false))
            .order_by_desc(verification_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest unconsumed code")?;
        model.map(verification_from_model).transpose()
    }

    async fn mark_consumed(&self, id: Uuid) -> Result<(), AccountServiceError> {
        verification_codes::ActiveModel {
            id: Set(id),
            consumed: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark code consumed")?;
        Ok(())
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<(), AccountServiceError> {
        verification_codes::Entity::update_many()
            .col_expr(
                verification_codes::Column::Attempts,
                Expr::col(verification_codes::Column::Attempts).add(1),
            )
            .filter(verification_codes::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("record failed attempt")?;
        Ok(())
    }

    async fn store_ticket(
        &self,
        id: Uuid,
        ticket_digest: &str,
        verified_at: DateTime<Utc>,
        ticket_expires_at: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        verification_codes::ActiveModel {
            id: Set(id),
            consumed: Set(true),
            verified_at: Set(Some(verified_at)),
            ticket_digest: Set(Some(ticket_digest.to_owned())),
            ticket_expires_at: Set(Some(ticket_expires_at)),
            ticket_consumed_at: Set(None),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("store ticket on verified code")?;
        Ok(())
    }
}

fn verification_from_model(
    model: verification_codes::Model,
) -> Result<VerificationCode, AccountServiceError> {
    let purpose = Purpose::from_str_value(&model.purpose)
        .ok_or_else(|| anyhow::anyhow!("unknown purpose {:?} on code {}", model.purpose, model.id))?;
    Ok(VerificationCode {
        id: model.id,
        email: model.email,
        purpose,
        code: model.code,
        expires_at: model.expires_at,
        consumed: model.consumed,
        verified_at: model.verified_at,
        attempts: model.attempts,
        created_ip: model.created_ip,
        created_ua: model.created_ua,
        ticket_digest: model.ticket_digest,
        ticket_expires_at: model.ticket_expires_at,
        ticket_consumed_at: model.ticket_consumed_at,
        created_at: model.created_at,
    })
}

// ── Account repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountServiceError> {
        let model = accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find account by id")?;
        model.map(account_from_model).transpose()
    }

    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountServiceError> {
        let mut condition = Condition::any().add(accounts::Column::Username.eq(identifier));
        if identifier.contains('@') {
            condition = condition.add(accounts::Column::Email.eq(normalize_email(identifier)));
        }
        let model = accounts::Entity::find()
            .filter(condition)
            .one(&self.db)
            .await
            .context("find account by identifier")?;
        model.map(account_from_model).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AccountServiceError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .count(&self.db)
            .await
            .context("check email exists")?;
        Ok(count > 0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AccountServiceError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .count(&self.db)
            .await
            .context("check username exists")?;
        Ok(count > 0)
    }

    async fn student_no_exists(&self, student_no: &str) -> Result<bool, AccountServiceError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::StudentNo.eq(student_no))
            .count(&self.db)
            .await
            .context("check student number exists")?;
        Ok(count > 0)
    }

    async fn employee_no_exists(&self, employee_no: &str) -> Result<bool, AccountServiceError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::EmployeeNo.eq(employee_no))
            .count(&self.db)
            .await
            .context("check employee number exists")?;
        Ok(count > 0)
    }

    async fn create_with_ticket(
        &self,
        account: &NewAccount,
        purpose: Purpose,
        ticket_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        let account = account.clone();
        let digest = ticket_digest.to_owned();
        self.db
            .transaction::<_, (), AccountServiceError>(move |txn| {
                Box::pin(async move {
                    consume_ticket(txn, &account.email, purpose, &digest, now).await?;
                    insert_account(txn, &account).await?;
                    Ok(())
                })
            })
            .await
            .map_err(tx_error)
    }

    async fn store_deletion_request(
        &self,
        account_id: Uuid,
        request: &DeletionRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AccountServiceError> {
        accounts::ActiveModel {
            id: Set(account_id),
            account_status: Set(AccountStatus::DeleteRequested.as_str().to_owned()),
            login_disabled: Set(false),
            delete_requested_at: Set(Some(request.requested_at)),
            delete_reason: Set(request.reason.clone()),
            delete_request_id: Set(Some(request.request_id.clone())),
            delete_request_ip: Set(request.request_ip.clone()),
            delete_request_ua: Set(request.request_ua.clone()),
            delete_otp_digest: Set(Some(request.otp_digest.clone())),
            delete_otp_expires_at: Set(Some(request.otp_expires_at)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("store deletion request")?;
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
        let expected = expected_request_id.map(str::to_owned);
        let replacement = replacement.clone();
        let reason = reason.map(str::to_owned);
        self.db
            .transaction::<_, (), AccountServiceError>(move |txn| {
                Box::pin(async move {
                    anonymize_account(
                        txn,
                        account_id,
                        expected.as_deref(),
                        &replacement,
                        reason,
                        confirmed_at,
                    )
                    .await
                })
            })
            .await
            .map_err(tx_error)
    }
}

/// Guarded ticket consumption: the single conditional UPDATE is the
/// synchronization primitive — only a row that is verified, unspent, and
/// unexpired can flip to consumed, and only one caller observes
/// `rows_affected == 1`. The follow-up read exists purely to pick an accurate
/// error for the losers and never performs the state change itself.
async fn consume_ticket(
    txn: &DatabaseTransaction,
    email: &str,
    purpose: Purpose,
    ticket_digest: &str,
    now: DateTime<Utc>,
) -> Result<(), AccountServiceError> {
    let result = verification_codes::Entity::update_many()
        .col_expr(
            verification_codes::Column::TicketConsumedAt,
            Expr::value(Some(now)),
        )
        .filter(verification_codes::Column::Email.eq(email))
        .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
        .filter(verification_codes::Column::TicketDigest.eq(ticket_digest))
        .filter(verification_codes::Column::Consumed.eq(true))
        .filter(verification_codes::Column::TicketConsumedAt.is_null())
        .filter(verification_codes::Column::TicketExpiresAt.gt(now))
        .exec(txn)
        .await
        .context("consume ticket")?;

    if result.rows_affected == 1 {
        return Ok(());
    }

    let record = verification_codes::Entity::find()
        .filter(verification_codes::Column::Email.eq(email))
        .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
        .filter(verification_codes::Column::TicketDigest.eq(ticket_digest))
        .one(txn)
        .await
        .context("diagnose failed ticket consumption")?;

    Err(match record {
        None => AccountServiceError::TicketInvalid,
        Some(r) if r.ticket_consumed_at.is_some() => AccountServiceError::TicketUsed,
        Some(r) if !r.consumed => AccountServiceError::TicketInvalid,
        Some(r) if r.ticket_expires_at.is_none_or(|t| t <= now) => {
            AccountServiceError::TicketExpired
        }
        Some(_) => AccountServiceError::TicketInvalid,
    })
}

async fn insert_account(
    txn: &DatabaseTransaction,
    account: &NewAccount,
) -> Result<(), AccountServiceError> {
    accounts::ActiveModel {
        id: Set(account.id),
        email: Set(account.email.clone()),
        username: Set(account.username.clone()),
        password_hash: Set(account.password_hash.clone()),
        role: Set(account.role),
        account_status: Set(AccountStatus::Active.as_str().to_owned()),
        login_disabled: Set(false),
        session_epoch: Set(0),
        full_name: Set(Some(account.full_name.clone())),
        bio: Set(None),
        gender: Set(account.gender.clone()),
        student_no: Set(account.student_no.clone()),
        employee_no: Set(account.employee_no.clone()),
        avatar_url: Set(None),
        delete_requested_at: Set(None),
        delete_reason: Set(None),
        delete_request_id: Set(None),
        delete_request_ip: Set(None),
        delete_request_ua: Set(None),
        delete_otp_digest: Set(None),
        delete_otp_expires_at: Set(None),
        anonymized_slug: Set(None),
        sanitized_at: Set(None),
        created_at: Set(account.created_at),
        updated_at: Set(account.created_at),
    }
    .insert(txn)
    .await
    .context("insert account")?;
    Ok(())
}

/// Anonymizing transition. Archive first, then a guarded UPDATE; a guard miss
/// returns an error so the whole transaction — archive row included — rolls
/// back. Concurrent confirms therefore produce exactly one archive row and
/// one anonymization.
async fn anonymize_account(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    expected_request_id: Option<&str>,
    replacement: &AnonymizedIdentity,
    reason: Option<String>,
    confirmed_at: DateTime<Utc>,
) -> Result<(), AccountServiceError> {
    let model = accounts::Entity::find_by_id(account_id)
        .one(txn)
        .await
        .context("load account for deletion")?
        .ok_or(AccountServiceError::AccountNotFound)?;

    let snapshot = serde_json::to_value(&model).context("serialize account snapshot")?;
    account_delete_archives::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        snapshot: Set(snapshot),
        reason: Set(reason),
        requested_at: Set(model.delete_requested_at),
        confirmed_at: Set(confirmed_at),
        created_at: Set(confirmed_at),
    }
    .insert(txn)
    .await
    .context("insert delete archive")?;

    let mut update = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Email,
            Expr::value(replacement.email.clone()),
        )
        .col_expr(
            accounts::Column::Username,
            Expr::value(replacement.username.clone()),
        )
        .col_expr(
            accounts::Column::PasswordHash,
            Expr::value(replacement.password_hash.clone()),
        )
        .col_expr(
            accounts::Column::AccountStatus,
            Expr::value(AccountStatus::Deleted.as_str()),
        )
        .col_expr(accounts::Column::LoginDisabled, Expr::value(true))
        .col_expr(accounts::Column::FullName, Expr::value(None::<String>))
        .col_expr(accounts::Column::Bio, Expr::value(None::<String>))
        .col_expr(accounts::Column::Gender, Expr::value(None::<String>))
        .col_expr(accounts::Column::StudentNo, Expr::value(None::<String>))
        .col_expr(accounts::Column::EmployeeNo, Expr::value(None::<String>))
        .col_expr(accounts::Column::AvatarUrl, Expr::value(None::<String>))
        .col_expr(
            accounts::Column::DeleteRequestedAt,
            Expr::value(None::<DateTime<Utc>>),
        )
        .col_expr(accounts::Column::DeleteReason, Expr::value(None::<String>))
        .col_expr(
            accounts::Column::DeleteRequestId,
            Expr::value(None::<String>),
        )
        .col_expr(
            accounts::Column::DeleteRequestIp,
            Expr::value(None::<String>),
        )
        .col_expr(
            accounts::Column::DeleteRequestUa,
            Expr::value(None::<String>),
        )
        .col_expr(
            accounts::Column::DeleteOtpDigest,
            Expr::value(None::<String>),
        )
        .col_expr(
            accounts::Column::DeleteOtpExpiresAt,
            Expr::value(None::<DateTime<Utc>>),
        )
        .col_expr(
            accounts::Column::AnonymizedSlug,
            Expr::value(Some(replacement.slug.clone())),
        )
        .col_expr(
            accounts::Column::SanitizedAt,
            Expr::value(Some(confirmed_at)),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(confirmed_at))
        .col_expr(
            accounts::Column::SessionEpoch,
            Expr::col(accounts::Column::SessionEpoch).add(1),
        )
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::AccountStatus.ne(AccountStatus::Deleted.as_str()));
    if let Some(request_id) = expected_request_id {
        update = update
            .filter(accounts::Column::AccountStatus.eq(AccountStatus::DeleteRequested.as_str()))
            .filter(accounts::Column::DeleteRequestId.eq(request_id));
    }

    let result = update.exec(txn).await.context("anonymize account")?;
    if result.rows_affected != 1 {
        let current = accounts::Entity::find_by_id(account_id)
            .one(txn)
            .await
            .context("reload account after failed guard")?;
        return Err(match current {
            Some(m) if m.account_status == AccountStatus::Deleted.as_str() => {
                AccountServiceError::AccountGone
            }
            _ => AccountServiceError::NoPendingRequest,
        });
    }
    Ok(())
}

fn account_from_model(model: accounts::Model) -> Result<Account, AccountServiceError> {
    let status = AccountStatus::from_str_value(&model.account_status).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown account status {:?} on account {}",
            model.account_status,
            model.id
        )
    })?;

    // The deletion block is all-or-nothing; partial presence would mean a bug
    // in the transition code, so surface it instead of guessing.
    let deletion = match (
        model.delete_request_id,
        model.delete_otp_digest,
        model.delete_otp_expires_at,
        model.delete_requested_at,
    ) {
        (None, None, None, None) => None,
        (Some(request_id), Some(otp_digest), Some(otp_expires_at), Some(requested_at)) => {
            Some(DeletionRequest {
                requested_at,
                reason: model.delete_reason.clone(),
                request_id,
                request_ip: model.delete_request_ip.clone(),
                request_ua: model.delete_request_ua.clone(),
                otp_digest,
                otp_expires_at,
            })
        }
        _ => {
            return Err(AccountServiceError::Internal(anyhow::anyhow!(
                "partial deletion-request state on account {}",
                model.id
            )));
        }
    };

    Ok(Account {
        id: model.id,
        email: model.email,
        username: model.username,
        password_hash: model.password_hash,
        role: model.role,
        status,
        login_disabled: model.login_disabled,
        session_epoch: model.session_epoch,
        full_name: model.full_name,
        bio: model.bio,
        gender: model.gender,
        student_no: model.student_no,
        employee_no: model.employee_no,
        avatar_url: model.avatar_url,
        deletion,
        anonymized_slug: model.anonymized_slug,
        sanitized_at: model.sanitized_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
