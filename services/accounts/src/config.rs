fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accounts service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3114). Env var: `ACCOUNTS_PORT`.
    pub accounts_port: u16,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// Transactional mail API endpoint (e.g. "https://api.brevo.com/v3/smtp/email").
    pub mail_api_url: String,
    /// API key for the mail provider.
    pub mail_api_key: String,
    /// Sender address for outbound mail.
    pub mail_sender: String,
    /// Product name used in email subjects/bodies.
    pub app_name: String,
    /// Registration OTP time-to-live in seconds (default 300).
    pub otp_ttl_secs: i64,
    /// Registration ticket time-to-live in seconds (default 1800).
    pub ticket_ttl_secs: i64,
    /// Deletion OTP time-to-live in seconds (default 900).
    pub delete_otp_ttl_secs: i64,
    /// Max OTP requests per email in a trailing hour (default 5).
    pub otp_max_per_email_hour: u64,
    /// Max OTP requests per IP in a trailing hour (default 20).
    pub otp_max_per_ip_hour: u64,
    /// Minimum spacing between OTP requests for the same email or IP (default 30).
    pub otp_cooldown_secs: i64,
    /// Failed logins within the window before an account locks (default 5).
    pub login_max_failures: u32,
    /// Sliding window for counting login failures, seconds (default 900).
    pub login_window_secs: i64,
    /// Lock duration once the threshold is reached, seconds (default 900).
    pub login_lock_secs: i64,
    /// Echo raw OTP codes in API responses. Development convenience only;
    /// must stay false in production-like environments.
    pub echo_codes: bool,
}

impl AccountsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            accounts_port: env_or("ACCOUNTS_PORT", 3114),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            mail_api_url: std::env::var("MAIL_API_URL").expect("MAIL_API_URL"),
            mail_api_key: std::env::var("MAIL_API_KEY").expect("MAIL_API_KEY"),
            mail_sender: std::env::var("MAIL_SENDER").expect("MAIL_SENDER"),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "Unilink".to_owned()),
            otp_ttl_secs: env_or("OTP_TTL_SECS", 300),
            ticket_ttl_secs: env_or("TICKET_TTL_SECS", 1800),
            delete_otp_ttl_secs: env_or("DELETE_OTP_TTL_SECS", 900),
            otp_max_per_email_hour: env_or("OTP_MAX_PER_EMAIL_HOUR", 5),
            otp_max_per_ip_hour: env_or("OTP_MAX_PER_IP_HOUR", 20),
            otp_cooldown_secs: env_or("OTP_COOLDOWN_SECS", 30),
            login_max_failures: env_or("LOGIN_MAX_FAILURES", 5),
            login_window_secs: env_or("LOGIN_WINDOW_SECS", 900),
            login_lock_secs: env_or("LOGIN_LOCK_SECS", 900),
            echo_codes: env_or("ECHO_CODES", false),
        }
    }
}
