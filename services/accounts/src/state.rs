use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AccountsConfig;
use crate::infra::db::{DbAccountRepository, DbVerificationRepository};
use crate::infra::mailer::HttpMailer;
use crate::limiter::LoginLimiter;
use crate::usecase::ratelimit::RateLimitConfig;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: HttpMailer,
    pub login_limiter: Arc<LoginLimiter>,
    pub config: Arc<AccountsConfig>,
}

impl AppState {
    pub fn verification_repo(&self) -> DbVerificationRepository {
        DbVerificationRepository {
            db: self.db.clone(),
        }
    }

    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn rate_limits(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_per_email_hour: self.config.otp_max_per_email_hour,
            max_per_ip_hour: self.config.otp_max_per_ip_hour,
            cooldown_secs: self.config.otp_cooldown_secs,
        }
    }
}
